//! Hooks that emit structured `tracing` events.

use async_trait::async_trait;

use crate::hooks::{
    AgentCallbacks, AgentEndEvent, AgentErrorEvent, AgentStartEvent, ClassifierCallbacks,
    ClassifierEndEvent, ClassifierErrorEvent, ClassifierStartEvent, HookContext, ToolCallbacks,
    ToolEndEvent, ToolErrorEvent, ToolStartEvent,
};

/// Logs every lifecycle stage through `tracing`.
///
/// Starts and successful ends are `info`, failures are `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCallbacks;

#[async_trait]
impl AgentCallbacks for TracingCallbacks {
    async fn on_agent_start(&self, event: &AgentStartEvent) -> HookContext {
        tracing::info!(
            phase = "agent",
            event = "start",
            agent_name = %event.agent_name,
            turn_id = %event.turn_id,
            "Agent turn started"
        );
        HookContext::empty()
    }

    async fn on_agent_end(&self, event: &AgentEndEvent, _context: &HookContext) {
        tracing::info!(
            phase = "agent",
            event = "end",
            agent_name = %event.agent_name,
            turn_id = %event.turn_id,
            cycles_used = event.summary.cycles_used,
            recursion_exhausted = event.summary.recursion_exhausted,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "Agent turn finished"
        );
    }

    async fn on_agent_error(&self, event: &AgentErrorEvent, _context: &HookContext) {
        tracing::warn!(
            phase = "agent",
            event = "error",
            agent_name = %event.agent_name,
            turn_id = %event.turn_id,
            elapsed_ms = event.elapsed.as_millis() as u64,
            error = %event.error,
            "Agent turn failed"
        );
    }
}

#[async_trait]
impl ClassifierCallbacks for TracingCallbacks {
    async fn on_classifier_start(&self, event: &ClassifierStartEvent) -> HookContext {
        tracing::info!(
            phase = "classifier",
            event = "start",
            candidates = event.candidates.len(),
            "Classification started"
        );
        HookContext::empty()
    }

    async fn on_classifier_end(&self, event: &ClassifierEndEvent, _context: &HookContext) {
        tracing::info!(
            phase = "classifier",
            event = "end",
            selected_agent = ?event.summary.selected_agent,
            confidence = event.summary.confidence,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "Classification finished"
        );
    }

    async fn on_classifier_error(&self, event: &ClassifierErrorEvent, _context: &HookContext) {
        tracing::warn!(
            phase = "classifier",
            event = "error",
            elapsed_ms = event.elapsed.as_millis() as u64,
            error = %event.error,
            "Classification failed"
        );
    }
}

#[async_trait]
impl ToolCallbacks for TracingCallbacks {
    async fn on_tool_start(&self, event: &ToolStartEvent) -> HookContext {
        tracing::info!(
            phase = "tool",
            event = "start",
            tool_name = %event.tool_name,
            invocation_id = %event.invocation_id,
            "Tool invocation started"
        );
        HookContext::empty()
    }

    async fn on_tool_end(&self, event: &ToolEndEvent, _context: &HookContext) {
        tracing::info!(
            phase = "tool",
            event = "end",
            tool_name = %event.tool_name,
            invocation_id = %event.invocation_id,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "Tool invocation finished"
        );
    }

    async fn on_tool_error(&self, event: &ToolErrorEvent, _context: &HookContext) {
        tracing::warn!(
            phase = "tool",
            event = "error",
            tool_name = %event.tool_name,
            invocation_id = %event.invocation_id,
            error_type = %event.error.error_type,
            elapsed_ms = event.elapsed.as_millis() as u64,
            error = %event.error.message,
            "Tool invocation failed"
        );
    }
}
