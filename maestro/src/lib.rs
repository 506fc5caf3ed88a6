//! # maestro - Tool Orchestration for Multi-Agent LLM Systems
//!
//! maestro turns plain Rust functions into tools that Claude, Bedrock and
//! OpenAI models can call, routes requests to the right agent, runs the
//! tool calls a model asks for and reports every stage to lifecycle hooks.
//!
//! ## Quick Start
//!
//! ```rust
//! use maestro::prelude::*;
//! use serde_json::json;
//!
//! /// Get the current weather for a city.
//! ///
//! /// # Arguments
//! ///
//! /// * `location` - City name
//! #[tool]
//! async fn get_weather(location: String) -> String {
//!     format!("Sunny in {location}")
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tools = ToolRegistry::builder().tool(GetWeatherTool::new()?).build()?;
//!
//! let provider = MockProvider::new(ProviderKind::Claude)
//!     .with_tool_call("get_weather", json!({"location": "Paris"}))
//!     .with_text_response("It is sunny in Paris.");
//! let agent = Agent::builder("weather", provider).tools(tools).build();
//!
//! let orchestrator = Orchestrator::builder(FixedClassifier::selecting("weather"))
//!     .agent(agent)
//!     .build()?;
//!
//! let response = orchestrator
//!     .route_request("Weather in Paris?", &[], &CancellationToken::new())
//!     .await?;
//! assert_eq!(response.agent_name, "weather");
//! assert_eq!(response.text(), "It is sunny in Paris.");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `macros` | The `#[tool]` attribute | ✅ |
//!
//! ## Architecture
//!
//! - [`maestro_core`] - Conversation messages, provider kinds and wire codecs
//! - [`maestro_tools`] - Schema derivation, provider export, the tool registry
//! - [`maestro_callbacks`] - Agent, classifier and tool lifecycle hooks
//! - [`maestro_agent`] - Dispatcher, recursion guard, agents and the orchestrator
//! - [`maestro_macros`] - The `#[tool]` attribute

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod telemetry;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Messages, provider kinds and wire codecs.
pub use maestro_core as core;

/// Tool system.
pub use maestro_tools as tools;

/// Lifecycle hooks.
pub use maestro_callbacks as callbacks;

/// Dispatch, agents and orchestration.
pub use maestro_agent as agent;

// ============================================================================
// Macro Re-exports
// ============================================================================

/// Attribute macro for tool functions.
#[cfg(feature = "macros")]
#[cfg_attr(docsrs, doc(cfg(feature = "macros")))]
pub use maestro_macros::tool;

// ============================================================================
// Flat Re-exports
// ============================================================================

// Messages
pub use maestro_core::{
    ContentBlock, ConversationMessage, ProviderKind, Role, ToolResultBlock, ToolUseBlock,
};

// Tools
pub use maestro_tools::{
    to_provider_format, DeriveOptions, FunctionSignature, FunctionTool, ProviderToolSpec,
    SchemaDeriver, SyncFunctionTool, Tool, ToolDefinition, ToolError, ToolErrorInfo,
    ToolRegistry,
};

// Hooks
pub use maestro_callbacks::{
    AgentCallbacks, CallbackBus, ClassifierCallbacks, HookContext, HookPolicy, NoopCallbacks,
    RecordingCallbacks, ToolCallbacks, TracingCallbacks,
};

// Agents
pub use maestro_agent::{
    Agent, AgentError, Classifier, ClassifierResult, DispatchPolicy, ModelProvider,
    Orchestrator, OrchestratorConfig, OrchestratorResponse, RecursionGuard, ToolDispatcher,
    TurnResult,
};

// Telemetry
pub use telemetry::{init_tracing, init_tracing_with, LogFormat};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude for common imports.
///
/// ```rust
/// use maestro::prelude::*;
/// ```
pub mod prelude {
    pub use maestro_agent::{
        Agent, AgentError, AgentProfile, Classifier, ClassifierResult, DispatchPolicy,
        FixedClassifier, MockProvider, ModelProvider, Orchestrator, OrchestratorConfig,
        ProviderError, TurnResult,
    };
    pub use maestro_callbacks::{
        AgentCallbacks, CallbackBus, ClassifierCallbacks, HookContext, ToolCallbacks,
    };
    pub use maestro_core::{ConversationMessage, ProviderKind, Role};
    pub use maestro_tools::prelude::*;
    pub use maestro_tools::ProviderToolSpec;

    pub use tokio_util::sync::CancellationToken;

    #[cfg(feature = "macros")]
    pub use maestro_macros::tool;
}
