//! Tool dispatch.
//!
//! The [`ToolDispatcher`] turns the tool-use blocks of a model message into
//! tool-result blocks. Every request is resolved, validated and executed
//! between the tool hooks of a [`CallbackBus`], and every failure becomes an
//! error result rather than an `Err`: nothing a tool or hook does escapes
//! [`ToolDispatcher::dispatch`].

use futures::future::join_all;
use maestro_callbacks::{CallbackBus, ToolStartEvent};
use maestro_core::{
    encode_message, ContentBlock, ConversationMessage, ProviderKind, Role, ToolResultBlock,
    ToolUseBlock, WireError,
};
use maestro_tools::{validate_arguments, ToolError, ToolErrorInfo, ToolRegistry};
use serde_json::Value as JsonValue;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{DispatchPolicy, OrchestratorConfig};

/// A model's request to run one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    /// Requested tool.
    pub tool_name: String,
    /// Correlation id, echoed in the result.
    pub invocation_id: String,
    /// Raw arguments from the model.
    pub arguments: JsonValue,
}

impl ToolInvocationRequest {
    /// Create a new request.
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

    /// Collect the tool-use blocks of a message, in order. Text is skipped.
    #[must_use]
    pub fn from_message(message: &ConversationMessage) -> Vec<Self> {
        message.tool_uses().map(Self::from).collect()
    }
}

impl From<&ToolUseBlock> for ToolInvocationRequest {
    fn from(block: &ToolUseBlock) -> Self {
        Self::new(block.name.clone(), block.id.clone(), block.input.clone())
    }
}

/// The outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationResult {
    /// Correlation id of the request.
    pub invocation_id: String,
    /// Requested tool.
    pub tool_name: String,
    /// Tool output, or the error sent back to the model.
    pub outcome: Result<JsonValue, ToolErrorInfo>,
}

impl ToolInvocationResult {
    /// Whether the invocation failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Error code, if the invocation failed.
    #[must_use]
    pub fn error_type(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(|e| e.error_type.as_str())
    }

    /// Convert into a tool-result content block.
    #[must_use]
    pub fn into_block(self) -> ContentBlock {
        let block = match self.outcome {
            Ok(output) => ToolResultBlock::success(self.invocation_id, output),
            Err(error) => ToolResultBlock::error(self.invocation_id, error.to_json()),
        };
        ContentBlock::ToolResult(block)
    }
}

/// Render a message of tool results in a provider's native shape.
pub fn encode_tool_results(
    kind: ProviderKind,
    message: &ConversationMessage,
) -> Result<JsonValue, WireError> {
    encode_message(kind, message)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(s) => *s,
        Err(panic) => panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .unwrap_or_else(|| "non-string panic payload".to_string()),
    }
}

/// Executes tool-use requests against a [`ToolRegistry`].
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    policy: DispatchPolicy,
    max_concurrent_tools: Option<usize>,
    default_timeout: Option<Duration>,
}

impl ToolDispatcher {
    /// Sequential dispatcher with no default timeout.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            policy: DispatchPolicy::Sequential,
            max_concurrent_tools: None,
            default_timeout: None,
        }
    }

    /// Dispatcher configured from an [`OrchestratorConfig`].
    #[must_use]
    pub fn from_config(registry: Arc<ToolRegistry>, config: &OrchestratorConfig) -> Self {
        Self {
            registry,
            policy: config.dispatch_policy,
            max_concurrent_tools: config.max_concurrent_tools,
            default_timeout: config.tool_timeout(),
        }
    }

    /// Set the dispatch policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap concurrently running tools under the parallel policy.
    #[must_use]
    pub fn with_max_concurrent_tools(mut self, max: usize) -> Self {
        self.max_concurrent_tools = Some(max.max(1));
        self
    }

    /// Timeout for tools that do not set their own.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Concurrency cap under the parallel policy.
    #[must_use]
    pub fn max_concurrent_tools(&self) -> Option<usize> {
        self.max_concurrent_tools
    }

    /// Timeout applied to tools that do not set their own.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// The registry tools are resolved from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// The dispatch policy.
    #[must_use]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Run every tool-use block of `message`.
    ///
    /// Returns a user-role message holding one tool-result block per
    /// tool-use block, in the same order.
    pub async fn dispatch(
        &self,
        message: &ConversationMessage,
        bus: &CallbackBus,
        cancel: &CancellationToken,
    ) -> ConversationMessage {
        let requests = ToolInvocationRequest::from_message(message);
        let results = self.dispatch_requests(requests, bus, cancel).await;
        ConversationMessage::new(
            Role::User,
            results
                .into_iter()
                .map(ToolInvocationResult::into_block)
                .collect(),
        )
    }

    /// Run a batch of requests. Results come back in request order.
    pub async fn dispatch_requests(
        &self,
        requests: Vec<ToolInvocationRequest>,
        bus: &CallbackBus,
        cancel: &CancellationToken,
    ) -> Vec<ToolInvocationResult> {
        tracing::debug!(
            count = requests.len(),
            policy = ?self.policy,
            "Dispatching tool calls"
        );

        match self.policy {
            DispatchPolicy::Sequential => {
                let mut results = Vec::with_capacity(requests.len());
                for request in requests {
                    results.push(self.invoke(request, bus, cancel).await);
                }
                results
            }
            DispatchPolicy::Parallel => {
                let futures: Vec<_> = requests
                    .into_iter()
                    .map(|request| self.invoke(request, bus, cancel))
                    .collect();

                match self.max_concurrent_tools {
                    Some(max) => {
                        let semaphore = Arc::new(Semaphore::new(max.max(1)));
                        let limited: Vec<_> = futures
                            .into_iter()
                            .map(|fut| {
                                let semaphore = Arc::clone(&semaphore);
                                async move {
                                    let _permit = semaphore.acquire().await.ok();
                                    fut.await
                                }
                            })
                            .collect();
                        join_all(limited).await
                    }
                    None => join_all(futures).await,
                }
            }
        }
    }

    async fn invoke(
        &self,
        request: ToolInvocationRequest,
        bus: &CallbackBus,
        cancel: &CancellationToken,
    ) -> ToolInvocationResult {
        let ToolInvocationRequest {
            tool_name,
            invocation_id,
            arguments,
        } = request;

        let span = tracing::debug_span!(
            "tool_invocation",
            tool_name = %tool_name,
            invocation_id = %invocation_id
        );
        let start = ToolStartEvent::new(tool_name.clone(), invocation_id.clone(), arguments.clone());
        let started = Instant::now();

        let outcome = bus
            .wrap_tool(start, async {
                self.execute(&tool_name, arguments, cancel)
                    .await
                    .map_err(ToolErrorInfo::from)
            })
            .instrument(span)
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => tracing::debug!(
                tool_name = %tool_name,
                invocation_id = %invocation_id,
                elapsed_ms,
                "Tool call succeeded"
            ),
            Err(error) => tracing::warn!(
                tool_name = %tool_name,
                invocation_id = %invocation_id,
                error_type = %error.error_type,
                elapsed_ms,
                error = %error.message,
                "Tool call failed"
            ),
        }

        ToolInvocationResult {
            invocation_id,
            tool_name,
            outcome,
        }
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: JsonValue,
        cancel: &CancellationToken,
    ) -> Result<JsonValue, ToolError> {
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let tool = self.registry.resolve(tool_name)?;
        let args = validate_arguments(tool.definition(), arguments)?;
        let timeout = tool.timeout().or(self.default_timeout);

        // Dropping the handle detaches the task, so a timed-out or cancelled
        // callable keeps running in the background.
        let mut handle = tokio::spawn(async move { tool.call(args).await });

        let joined = match timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ToolError::Cancelled),
                joined = tokio::time::timeout(limit, &mut handle) => match joined {
                    Ok(joined) => joined,
                    Err(_) => return Err(ToolError::timeout(limit)),
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ToolError::Cancelled),
                joined = &mut handle => joined,
            },
        };

        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(ToolError::fault(format!(
                "tool panicked: {}",
                panic_message(err.into_panic())
            ))),
            Err(_) => Err(ToolError::Cancelled),
        }
    }
}
