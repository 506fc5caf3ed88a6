//! Agent-level error types.
//!
//! Tool failures are not represented here: the dispatcher turns them into
//! error result blocks that go back to the model. Only the errors below can
//! abort a turn or a routed request.

use thiserror::Error;

/// Errors raised by a [`ModelProvider`](crate::provider::ModelProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or failed mid-request.
    #[error("Transport failure: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a retry may succeed.
        retryable: bool,
    },

    /// The provider returned something that is not a valid message.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }
}

/// Errors raised by a [`Classifier`](crate::classifier::Classifier).
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Classification failed.
    #[error("Classification failed: {0}")]
    Failed(String),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Invalid orchestrator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is outside its allowed range.
    #[error("Invalid value for '{field}': {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// An environment variable could not be parsed.
    #[error("Environment variable {key} has invalid value '{value}'")]
    Env {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The JSON document could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Errors that abort an agent turn or a routed request.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model provider failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The turn was cancelled.
    #[error("Agent run was cancelled")]
    Cancelled,

    /// Tool declarations could not be exported for the provider.
    #[error("Tool export failed: {0}")]
    Export(#[from] maestro_tools::ExportError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The classifier failed.
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// The classifier picked no agent and there is no default.
    #[error("No agent selected for input")]
    NoAgentSelected,

    /// The classifier picked an agent that is not registered.
    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),
}

impl AgentError {
    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(AgentError::from(ProviderError::transport("reset", true)).is_retryable());
        assert!(!AgentError::from(ProviderError::Rejected("bad".into())).is_retryable());
        assert!(!AgentError::Cancelled.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ConfigError::invalid("max_concurrent_tools", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'max_concurrent_tools': must be at least 1"
        );
    }
}
