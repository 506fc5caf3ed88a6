//! Core error types.

use thiserror::Error;

/// A provider format was requested that this crate cannot produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported provider format: '{provider}'")]
pub struct UnsupportedFormatError {
    /// The provider name that was requested.
    pub provider: String,
}

impl UnsupportedFormatError {
    /// Create a new error for the given provider name.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

/// A provider-native message could not be decoded.
#[derive(Debug, Error)]
pub enum WireError {
    /// The document does not have the expected shape.
    #[error("Malformed {provider} message: {message}")]
    Malformed {
        /// Provider whose format was being decoded.
        provider: &'static str,
        /// What was wrong.
        message: String,
    },

    /// The role is not one the canonical model understands.
    #[error("Unsupported role '{0}'")]
    UnsupportedRole(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    /// Create a malformed-message error.
    #[must_use]
    pub fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            provider,
            message: message.into(),
        }
    }
}
