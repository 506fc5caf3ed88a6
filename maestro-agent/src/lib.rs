//! Tool dispatch and the agent loop for maestro.
//!
//! This crate ties the tool system to a model provider:
//!
//! - [`ToolDispatcher`]: resolve, validate and run tool calls, with hooks
//! - [`RecursionGuard`]: bound tool-call round trips within a turn
//! - [`Agent`]: run one conversational turn against a [`ModelProvider`]
//! - [`Orchestrator`]: classify an input and route it to an agent
//! - [`OrchestratorConfig`]: shared settings with JSON and environment loading
//!
//! # Example
//!
//! ```rust
//! use maestro_agent::{Agent, MockProvider};
//! use maestro_callbacks::CallbackBus;
//! use maestro_core::ProviderKind;
//! use maestro_tools::{DeriveOptions, FunctionSignature, ToolRegistry};
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tools = ToolRegistry::builder()
//!     .function(
//!         &FunctionSignature::new("add").param("a", "i64").param("b", "i64"),
//!         &DeriveOptions::new().with_description("Add two integers"),
//!         |args| async move {
//!             let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
//!             Ok(json!(sum))
//!         },
//!     )?
//!     .build()?;
//!
//! let provider = MockProvider::new(ProviderKind::OpenAi)
//!     .with_tool_call("add", json!({"a": 2, "b": 3}))
//!     .with_text_response("2 + 3 = 5");
//!
//! let agent = Agent::builder("calculator", provider).tools(tools).build();
//! let turn = agent
//!     .run("What is 2 + 3?", &[], &CallbackBus::new(), &CancellationToken::new())
//!     .await?;
//!
//! assert_eq!(turn.text(), "2 + 3 = 5");
//! assert_eq!(turn.cycles_used, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod agent;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod recursion;

pub use agent::{Agent, AgentBuilder, TurnResult};
pub use classifier::{AgentProfile, Classifier, ClassifierResult};
pub use config::{DispatchPolicy, HookMode, OrchestratorConfig, ENV_PREFIX};
pub use dispatcher::{
    encode_tool_results, ToolDispatcher, ToolInvocationRequest, ToolInvocationResult,
};
pub use errors::{AgentError, ClassifierError, ConfigError, ProviderError};
pub use mock::{FixedClassifier, FunctionProvider, MockProvider, RecordedRequest};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorResponse};
pub use provider::ModelProvider;
pub use recursion::{RecursionGuard, RecursionState, DEFAULT_MAX_RECURSIONS};
