//! Hooks that remember what they saw.
//!
//! Useful in tests and for debugging hook wiring. Every start hook returns a
//! context naming the hook, so callers can check that the same context
//! reaches the matching end or error hook.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

use crate::hooks::{
    AgentCallbacks, AgentEndEvent, AgentErrorEvent, AgentStartEvent, ClassifierCallbacks,
    ClassifierEndEvent, ClassifierErrorEvent, ClassifierStartEvent, HookContext, ToolCallbacks,
    ToolEndEvent, ToolErrorEvent, ToolStartEvent,
};

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Hook that fired, e.g. `tool_start`.
    pub hook: &'static str,
    /// Agent, tool or input the hook was about.
    pub subject: String,
    /// Context the hook received (or returned, for start hooks).
    pub context: HookContext,
    /// Stage-specific detail: arguments, output or error.
    pub detail: JsonValue,
}

/// Records every hook call in order.
#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingCallbacks {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(
        &self,
        hook: &'static str,
        subject: &str,
        context: HookContext,
        detail: JsonValue,
    ) -> HookContext {
        self.events.lock().push(RecordedEvent {
            hook,
            subject: subject.to_string(),
            context: context.clone(),
            detail,
        });
        context
    }

    fn start(&self, hook: &'static str, subject: &str, detail: JsonValue) -> HookContext {
        let context = HookContext::new(json!({ "hook": hook, "subject": subject }));
        self.record(hook, subject, context, detail)
    }

    /// All recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Hook names in firing order.
    #[must_use]
    pub fn hooks(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.hook).collect()
    }

    /// How often a hook fired.
    #[must_use]
    pub fn count(&self, hook: &str) -> usize {
        self.events.lock().iter().filter(|e| e.hook == hook).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl AgentCallbacks for RecordingCallbacks {
    async fn on_agent_start(&self, event: &AgentStartEvent) -> HookContext {
        self.start("agent_start", &event.agent_name, json!(event.input))
    }

    async fn on_agent_end(&self, event: &AgentEndEvent, context: &HookContext) {
        let detail = json!({
            "output": event.summary.output,
            "cycles_used": event.summary.cycles_used,
            "recursion_exhausted": event.summary.recursion_exhausted,
        });
        self.record("agent_end", &event.agent_name, context.clone(), detail);
    }

    async fn on_agent_error(&self, event: &AgentErrorEvent, context: &HookContext) {
        self.record("agent_error", &event.agent_name, context.clone(), json!(event.error));
    }
}

#[async_trait]
impl ClassifierCallbacks for RecordingCallbacks {
    async fn on_classifier_start(&self, event: &ClassifierStartEvent) -> HookContext {
        self.start("classifier_start", &event.input, json!(event.candidates))
    }

    async fn on_classifier_end(&self, event: &ClassifierEndEvent, context: &HookContext) {
        let subject = event.summary.selected_agent.as_deref().unwrap_or_default();
        self.record(
            "classifier_end",
            subject,
            context.clone(),
            json!(event.summary.confidence),
        );
    }

    async fn on_classifier_error(&self, event: &ClassifierErrorEvent, context: &HookContext) {
        self.record("classifier_error", &event.input, context.clone(), json!(event.error));
    }
}

#[async_trait]
impl ToolCallbacks for RecordingCallbacks {
    async fn on_tool_start(&self, event: &ToolStartEvent) -> HookContext {
        self.start("tool_start", &event.tool_name, event.arguments.clone())
    }

    async fn on_tool_end(&self, event: &ToolEndEvent, context: &HookContext) {
        self.record("tool_end", &event.tool_name, context.clone(), event.output.clone());
    }

    async fn on_tool_error(&self, event: &ToolErrorEvent, context: &HookContext) {
        self.record("tool_error", &event.tool_name, context.clone(), event.error.to_json());
    }
}
