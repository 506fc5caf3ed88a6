//! # maestro-callbacks
//!
//! Lifecycle hooks for maestro.
//!
//! Three hook categories surround the stages of a request: agent turns,
//! classification and tool invocations. Implement [`AgentCallbacks`],
//! [`ClassifierCallbacks`] or [`ToolCallbacks`], register the implementation
//! on a [`CallbackBus`] and pass the bus to whatever runs the stage.
//!
//! A hook that panics or runs too long is logged and skipped. It never
//! changes the result of the stage it observes.
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use maestro_callbacks::{CallbackBus, HookContext, ToolCallbacks, ToolStartEvent};
//! use serde_json::json;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl ToolCallbacks for Audit {
//!     async fn on_tool_start(&self, event: &ToolStartEvent) -> HookContext {
//!         HookContext::new(json!({ "audited": event.tool_name }))
//!     }
//! }
//!
//! let bus = CallbackBus::builder().tool(Audit).build();
//! assert!(bus.has_tool_callbacks());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bus;
pub mod hooks;
pub mod recording;
pub mod tracing_hooks;

pub use bus::{CallbackBus, CallbackBusBuilder, HookPolicy, DEFAULT_HOOK_TIMEOUT};
pub use hooks::{
    AgentCallbacks, AgentEndEvent, AgentErrorEvent, AgentStartEvent, AgentSummary,
    ClassifierCallbacks, ClassifierEndEvent, ClassifierErrorEvent, ClassifierStartEvent,
    ClassifierSummary, HookContext, NoopCallbacks, ToolCallbacks, ToolEndEvent, ToolErrorEvent,
    ToolStartEvent,
};
pub use recording::{RecordedEvent, RecordingCallbacks};
pub use tracing_hooks::TracingCallbacks;
