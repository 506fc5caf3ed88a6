//! Hook traits and the events passed to them.
//!
//! Every hook has a no-op default, so an implementation only overrides the
//! stages it cares about. Start hooks return a [`HookContext`] that is handed
//! back unchanged to the matching end or error hook.

use async_trait::async_trait;
use maestro_tools::ToolErrorInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Opaque value carried from a start hook to its end or error hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookContext(pub JsonValue);

impl HookContext {
    /// Wrap a JSON value.
    #[must_use]
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Context with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the context carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    /// The wrapped value.
    #[must_use]
    pub fn value(&self) -> &JsonValue {
        &self.0
    }
}

impl From<JsonValue> for HookContext {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

// ============================================================================
// Agent
// ============================================================================

/// An agent is about to handle a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStartEvent {
    /// Agent name.
    pub agent_name: String,
    /// Turn id.
    pub turn_id: String,
    /// User input that started the turn.
    pub input: String,
}

impl AgentStartEvent {
    /// Create a new event.
    pub fn new(
        agent_name: impl Into<String>,
        turn_id: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            turn_id: turn_id.into(),
            input: input.into(),
        }
    }
}

/// What an agent turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSummary {
    /// Final response text.
    pub output: String,
    /// Tool-call batches executed.
    pub cycles_used: u32,
    /// Whether the turn stopped because the recursion limit was hit.
    pub recursion_exhausted: bool,
}

/// An agent finished a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEndEvent {
    /// Agent name.
    pub agent_name: String,
    /// Turn id.
    pub turn_id: String,
    /// Turn summary.
    pub summary: AgentSummary,
    /// Wall time of the turn.
    pub elapsed: Duration,
}

/// An agent turn failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentErrorEvent {
    /// Agent name.
    pub agent_name: String,
    /// Turn id.
    pub turn_id: String,
    /// Rendered error.
    pub error: String,
    /// Wall time until the failure.
    pub elapsed: Duration,
}

/// Hooks around an agent turn.
#[async_trait]
pub trait AgentCallbacks: Send + Sync {
    /// Called before the agent starts.
    async fn on_agent_start(&self, _event: &AgentStartEvent) -> HookContext {
        HookContext::empty()
    }

    /// Called after the agent finished.
    async fn on_agent_end(&self, _event: &AgentEndEvent, _context: &HookContext) {}

    /// Called when the agent failed.
    async fn on_agent_error(&self, _event: &AgentErrorEvent, _context: &HookContext) {}
}

// ============================================================================
// Classifier
// ============================================================================

/// The classifier is about to route an input.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierStartEvent {
    /// Input being classified.
    pub input: String,
    /// Names of the agents available for selection.
    pub candidates: Vec<String>,
}

impl ClassifierStartEvent {
    /// Create a new event.
    pub fn new(input: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            input: input.into(),
            candidates,
        }
    }
}

/// What the classifier decided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierSummary {
    /// Selected agent, if any.
    pub selected_agent: Option<String>,
    /// Confidence in the selection.
    pub confidence: f64,
}

/// The classifier finished.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierEndEvent {
    /// Input that was classified.
    pub input: String,
    /// Classification summary.
    pub summary: ClassifierSummary,
    /// Wall time of the classification.
    pub elapsed: Duration,
}

/// The classifier failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierErrorEvent {
    /// Input that was being classified.
    pub input: String,
    /// Rendered error.
    pub error: String,
    /// Wall time until the failure.
    pub elapsed: Duration,
}

/// Hooks around classification.
#[async_trait]
pub trait ClassifierCallbacks: Send + Sync {
    /// Called before classification.
    async fn on_classifier_start(&self, _event: &ClassifierStartEvent) -> HookContext {
        HookContext::empty()
    }

    /// Called after classification.
    async fn on_classifier_end(&self, _event: &ClassifierEndEvent, _context: &HookContext) {}

    /// Called when classification failed.
    async fn on_classifier_error(&self, _event: &ClassifierErrorEvent, _context: &HookContext) {}
}

// ============================================================================
// Tool
// ============================================================================

/// A tool invocation is about to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStartEvent {
    /// Requested tool name.
    pub tool_name: String,
    /// Invocation id from the model.
    pub invocation_id: String,
    /// Raw arguments from the model.
    pub arguments: JsonValue,
}

impl ToolStartEvent {
    /// Create a new event.
    pub fn new(
        tool_name: impl Into<String>,
        invocation_id: impl Into<String>,
        arguments: JsonValue,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            invocation_id: invocation_id.into(),
            arguments,
        }
    }
}

/// A tool invocation succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEndEvent {
    /// Tool name.
    pub tool_name: String,
    /// Invocation id.
    pub invocation_id: String,
    /// Value returned by the tool.
    pub output: JsonValue,
    /// Wall time of the invocation.
    pub elapsed: Duration,
}

/// A tool invocation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolErrorEvent {
    /// Tool name.
    pub tool_name: String,
    /// Invocation id.
    pub invocation_id: String,
    /// Error detail, as sent back to the model.
    pub error: ToolErrorInfo,
    /// Wall time until the failure.
    pub elapsed: Duration,
}

/// Hooks around a single tool invocation.
#[async_trait]
pub trait ToolCallbacks: Send + Sync {
    /// Called before the tool is resolved.
    async fn on_tool_start(&self, _event: &ToolStartEvent) -> HookContext {
        HookContext::empty()
    }

    /// Called after the tool returned a value.
    async fn on_tool_end(&self, _event: &ToolEndEvent, _context: &HookContext) {}

    /// Called when resolution, validation or the call itself failed.
    async fn on_tool_error(&self, _event: &ToolErrorEvent, _context: &HookContext) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallbacks;

impl AgentCallbacks for NoopCallbacks {}
impl ClassifierCallbacks for NoopCallbacks {}
impl ToolCallbacks for NoopCallbacks {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hook_context_is_transparent() {
        let ctx = HookContext::new(json!({"span": 7}));
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"span": 7}));
        assert!(!ctx.is_empty());
        assert!(HookContext::empty().is_empty());
    }

    #[tokio::test]
    async fn test_default_hooks_return_empty_context() {
        let hooks = NoopCallbacks;
        let ctx = hooks
            .on_tool_start(&ToolStartEvent::new("t", "call_1", json!({})))
            .await;
        assert!(ctx.is_empty());
    }
}
