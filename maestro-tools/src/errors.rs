//! Tool-specific error types.
//!
//! [`SchemaError`] is raised while deriving or registering tools and is fatal
//! at startup. [`ToolError`] covers a single invocation and is never raised
//! out of dispatch: it is turned into a [`ToolErrorInfo`] payload that rides
//! back to the model inside a tool-result block.

use maestro_core::UnsupportedFormatError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while deriving a schema or building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The tool name is empty or contains characters a provider rejects.
    #[error("Invalid tool name '{0}': expected 1-64 characters of [A-Za-z0-9_-]")]
    InvalidName(String),

    /// Two parameters share a name.
    #[error("Duplicate parameter '{0}'")]
    DuplicateParameter(String),

    /// An enum constraint names a parameter the tool does not have.
    #[error("Enum constraint for unknown parameter '{0}'")]
    UnknownEnumParameter(String),

    /// A property override names a parameter the tool does not have.
    #[error("Property override for unknown parameter '{0}'")]
    UnknownOverride(String),

    /// An enum constraint allows no values.
    #[error("Enum constraint for '{0}' is empty")]
    EmptyEnum(String),

    /// A parameter default is not one of its allowed values.
    #[error("Default value of '{0}' is not one of its allowed values")]
    DefaultNotInEnum(String),

    /// A parameter default is not an instance of the parameter's type.
    #[error("Default value of '{0}' does not match its declared type")]
    DefaultTypeMismatch(String),

    /// An allowed value is not an instance of the parameter's type.
    #[error("Allowed value {value} of '{parameter}' does not match its declared type")]
    EnumTypeMismatch {
        /// Parameter name.
        parameter: String,
        /// The offending value, rendered as JSON.
        value: String,
    },

    /// Two tools share a name in one registry.
    #[error("Duplicate tool '{0}'")]
    DuplicateTool(String),
}

/// Errors raised by the format exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested provider is not supported.
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    /// An exported document does not have the expected shape.
    #[error("Malformed {provider} tool spec: {message}")]
    Malformed {
        /// Provider whose shape was expected.
        provider: String,
        /// What was wrong.
        message: String,
    },

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while invoking a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments do not satisfy the tool's schema.
    #[error("Invalid arguments: {message}")]
    InvalidArguments {
        /// Validation error message.
        message: String,
        /// Field that failed validation, if applicable.
        field: Option<String>,
    },

    /// The callable itself failed (returned an error or panicked).
    #[error("Tool execution failed: {message}")]
    CallableFault {
        /// Error message.
        message: String,
        /// Whether the model may retry the same call.
        retryable: bool,
    },

    /// Tool execution timed out.
    #[error("Tool execution timed out after {0:?}")]
    Timeout(Duration),

    /// Tool was cancelled.
    #[error("Tool execution cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other application errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolError {
    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CallableFault { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            Self::NotFound(_)
            | Self::InvalidArguments { .. }
            | Self::Cancelled
            | Self::Json(_)
            | Self::Other(_) => false,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArguments { .. } => "argument_error",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::CallableFault { .. } | Self::Json(_) | Self::Other(_) => "callable_fault",
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: msg.into(),
            field: None,
        }
    }

    /// Create an invalid arguments error for a specific field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a non-retryable callable fault.
    #[must_use]
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::CallableFault {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a retryable callable fault.
    #[must_use]
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::CallableFault {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::fault(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::fault(s)
    }
}

/// Serializable error information for a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolErrorInfo {
    /// Error type/code.
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the error is retryable.
    pub retryable: bool,
    /// Additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ToolErrorInfo {
    /// Create a new error info.
    #[must_use]
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            retryable: false,
            details: None,
        }
    }

    /// Set retryable flag.
    #[must_use]
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Add details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Render as a JSON value for a tool-result payload.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::String(self.message.clone()))
    }
}

impl From<&ToolError> for ToolErrorInfo {
    fn from(err: &ToolError) -> Self {
        let details = match err {
            ToolError::InvalidArguments {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        Self {
            error_type: err.error_type().to_string(),
            message: err.message(),
            retryable: err.is_retryable(),
            details,
        }
    }
}

impl From<ToolError> for ToolErrorInfo {
    fn from(err: ToolError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fault_not_retryable() {
        let err = ToolError::fault("Something went wrong");
        assert!(!err.is_retryable());
        assert!(err.message().contains("Something went wrong"));
        assert_eq!(err.error_type(), "callable_fault");
    }

    #[test]
    fn test_retryable_fault() {
        let err = ToolError::retryable("Temporary failure");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout() {
        let err = ToolError::timeout(Duration::from_secs(30));
        assert!(err.is_retryable());
        assert!(err.message().contains("30"));
    }

    #[test]
    fn test_anyhow_is_callable_fault() {
        let err: ToolError = anyhow::anyhow!("db unavailable").into();
        assert_eq!(err.error_type(), "callable_fault");
        assert_eq!(err.message(), "db unavailable");
    }

    #[test]
    fn test_error_info_carries_field() {
        let err = ToolError::invalid_field("units", "expected one of [\"metric\",\"imperial\"]");
        let info = ToolErrorInfo::from(&err);
        assert_eq!(info.error_type, "argument_error");
        assert!(!info.retryable);
        assert_eq!(info.details, Some(serde_json::json!({"field": "units"})));
    }

    #[test]
    fn test_error_info_json_shape() {
        let info = ToolErrorInfo::from(ToolError::not_found("nope"));
        let json = info.to_json();
        assert_eq!(json["error_type"], "not_found");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_from_string() {
        let err: ToolError = "error message".into();
        assert!(matches!(err, ToolError::CallableFault { .. }));
    }
}
