//! The tool-using agent.
//!
//! An [`Agent`] runs one conversational turn: it sends the conversation to
//! its [`ModelProvider`], dispatches any tool calls in the reply, feeds the
//! results back and repeats until the model answers without tool calls or
//! the [`RecursionGuard`] runs out.

use maestro_callbacks::{AgentStartEvent, AgentSummary, CallbackBus};
use maestro_core::{generate_turn_id, ConversationMessage};
use maestro_tools::ToolRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{DispatchPolicy, OrchestratorConfig};
use crate::dispatcher::ToolDispatcher;
use crate::errors::AgentError;
use crate::provider::ModelProvider;
use crate::recursion::RecursionGuard;

/// Outcome of one agent turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// Turn id.
    pub turn_id: String,
    /// Agent that handled the turn.
    pub agent_name: String,
    /// The model's last reply.
    pub response: ConversationMessage,
    /// Messages added during the turn, starting with the user input.
    pub messages: Vec<ConversationMessage>,
    /// Tool-call batches executed.
    pub cycles_used: u32,
    /// Whether the turn stopped because the recursion limit was reached.
    /// The last reply may then still contain unanswered tool calls.
    pub recursion_exhausted: bool,
}

impl TurnResult {
    /// Text of the last reply.
    #[must_use]
    pub fn text(&self) -> String {
        self.response.text()
    }

    fn summary(&self) -> AgentSummary {
        AgentSummary {
            output: self.text(),
            cycles_used: self.cycles_used,
            recursion_exhausted: self.recursion_exhausted,
        }
    }
}

/// A named agent backed by one provider and one tool registry.
///
/// # Example
///
/// ```rust
/// use maestro_agent::{Agent, MockProvider};
/// use maestro_callbacks::CallbackBus;
/// use maestro_core::ProviderKind;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let agent = Agent::builder("greeter", MockProvider::new(ProviderKind::Claude).with_text_response("Hi!"))
///     .description("Says hello")
///     .build();
///
/// let turn = agent
///     .run("Hello", &[], &CallbackBus::new(), &CancellationToken::new())
///     .await?;
/// assert_eq!(turn.text(), "Hi!");
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    name: String,
    description: String,
    provider: Arc<dyn ModelProvider>,
    dispatcher: ToolDispatcher,
    max_recursions: u32,
    settings: AgentSettings,
}

/// Settings the agent's builder fixed, as opposed to inherited ones.
#[derive(Debug, Clone, Default)]
struct AgentSettings {
    config: Option<OrchestratorConfig>,
    max_recursions: Option<u32>,
    dispatch_policy: Option<DispatchPolicy>,
}

impl AgentSettings {
    fn resolve(&self, inherited: &OrchestratorConfig) -> OrchestratorConfig {
        let mut config = self.config.clone().unwrap_or_else(|| inherited.clone());
        if let Some(max) = self.max_recursions {
            config.max_recursions = max;
        }
        if let Some(policy) = self.dispatch_policy {
            config.dispatch_policy = policy;
        }
        config
    }
}

impl Agent {
    /// Start building an agent.
    pub fn builder<P: ModelProvider + 'static>(name: impl Into<String>, provider: P) -> AgentBuilder {
        AgentBuilder::new(name, Arc::new(provider))
    }

    /// Agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Agent description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The agent's tools.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    /// The agent's provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Tool-call batches allowed per turn.
    #[must_use]
    pub fn max_recursions(&self) -> u32 {
        self.max_recursions
    }

    /// The agent's tool dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Inherit recursion and dispatch settings from a shared configuration.
    ///
    /// Values set on the agent's builder, through
    /// [`AgentBuilder::config`], [`AgentBuilder::max_recursions`] or
    /// [`AgentBuilder::dispatch_policy`], take precedence.
    pub fn apply_config(&mut self, inherited: &OrchestratorConfig) {
        let config = self.settings.resolve(inherited);
        let registry = Arc::clone(self.dispatcher.registry());
        self.dispatcher = ToolDispatcher::from_config(registry, &config);
        self.max_recursions = config.max_recursions;
    }

    /// Run one turn for `input`, continuing from `history`.
    ///
    /// Agent hooks surround the whole turn and tool hooks surround every
    /// tool call. Only provider failures and cancellation produce an `Err`.
    pub async fn run(
        &self,
        input: &str,
        history: &[ConversationMessage],
        bus: &CallbackBus,
        cancel: &CancellationToken,
    ) -> Result<TurnResult, AgentError> {
        let turn_id = generate_turn_id();
        let span = tracing::info_span!(
            "agent_turn",
            agent_name = %self.name,
            turn_id = %turn_id
        );
        let start = AgentStartEvent::new(self.name.clone(), turn_id.clone(), input);

        bus.wrap_agent(
            start,
            self.run_turn(turn_id, input, history, bus, cancel),
            TurnResult::summary,
        )
        .instrument(span)
        .await
    }

    async fn run_turn(
        &self,
        turn_id: String,
        input: &str,
        history: &[ConversationMessage],
        bus: &CallbackBus,
        cancel: &CancellationToken,
    ) -> Result<TurnResult, AgentError> {
        let tools = self.registry().export_all(self.provider.kind())?;
        let mut conversation = history.to_vec();
        let first_new = conversation.len();
        conversation.push(ConversationMessage::user(input));

        let mut guard = RecursionGuard::new(self.max_recursions);
        tracing::info!(
            provider = self.provider.name(),
            tool_count = tools.len(),
            max_recursions = self.max_recursions,
            "Agent turn started"
        );

        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                response = self.provider.converse(&conversation, &tools) => response?,
            };
            conversation.push(response.clone());

            let recursion_exhausted = if response.has_tool_use() {
                if guard.try_consume() {
                    let results = self.dispatcher.dispatch(&response, bus, cancel).await;
                    conversation.push(results);
                    continue;
                }
                tracing::info!(
                    cycles_used = guard.cycles_used(),
                    "Recursion limit reached, returning last response"
                );
                true
            } else {
                false
            };

            tracing::info!(
                cycles_used = guard.cycles_used(),
                recursion_exhausted,
                "Agent turn finished"
            );
            return Ok(TurnResult {
                turn_id,
                agent_name: self.name.clone(),
                response,
                messages: conversation.split_off(first_new),
                cycles_used: guard.cycles_used(),
                recursion_exhausted,
            });
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("tools", &self.registry().names())
            .field("max_recursions", &self.max_recursions)
            .finish()
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    name: String,
    description: String,
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    settings: AgentSettings,
}

impl AgentBuilder {
    /// Create a builder with an empty registry and default settings.
    pub fn new(name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            provider,
            registry: Arc::new(ToolRegistry::empty()),
            settings: AgentSettings::default(),
        }
    }

    /// Set the description shown to classifiers.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Use these tools.
    #[must_use]
    pub fn tools(self, registry: ToolRegistry) -> Self {
        self.shared_tools(Arc::new(registry))
    }

    /// Use an already shared registry.
    #[must_use]
    pub fn shared_tools(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Take recursion and dispatch settings from a configuration.
    ///
    /// The agent then ignores the configuration of any orchestrator it is
    /// registered with.
    #[must_use]
    pub fn config(mut self, config: &OrchestratorConfig) -> Self {
        self.settings.config = Some(config.clone());
        self
    }

    /// Set the recursion limit.
    #[must_use]
    pub fn max_recursions(mut self, max: u32) -> Self {
        self.settings.max_recursions = Some(max);
        self
    }

    /// Set the dispatch policy.
    #[must_use]
    pub fn dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.settings.dispatch_policy = Some(policy);
        self
    }

    /// Build the agent.
    #[must_use]
    pub fn build(self) -> Agent {
        let config = self.settings.resolve(&OrchestratorConfig::default());
        Agent {
            name: self.name,
            description: self.description,
            provider: self.provider,
            dispatcher: ToolDispatcher::from_config(self.registry, &config),
            max_recursions: config.max_recursions,
            settings: self.settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::mock::{FunctionProvider, MockProvider};
    use maestro_callbacks::RecordingCallbacks;
    use maestro_core::{ContentBlock, ProviderKind, Role};
    use maestro_tools::{ParamType, ParameterSpec, SyncFunctionTool, ToolArgs, ToolDefinition};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn weather_tools() -> ToolRegistry {
        ToolRegistry::builder()
            .tool(SyncFunctionTool::new(
                ToolDefinition::new("get_weather", "Get the weather")
                    .with_parameter("location", ParameterSpec::new(ParamType::String)),
                |args: ToolArgs| Ok(json!({"location": args["location"], "sky": "clear"})),
            ))
            .build()
            .unwrap()
    }

    fn run_args() -> (CallbackBus, CancellationToken) {
        (CallbackBus::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let provider = MockProvider::new(ProviderKind::Claude)
            .with_tool_call("get_weather", json!({"location": "Paris"}))
            .with_text_response("Clear skies in Paris.");
        let agent = Agent::builder("weather", provider.clone())
            .tools(weather_tools())
            .build();
        let (bus, cancel) = run_args();

        let turn = agent.run("Weather in Paris?", &[], &bus, &cancel).await.unwrap();

        assert_eq!(turn.text(), "Clear skies in Paris.");
        assert_eq!(turn.cycles_used, 1);
        assert!(!turn.recursion_exhausted);
        assert_eq!(turn.messages.len(), 4);
        assert_eq!(turn.messages[2].role, Role::User);
        let result = turn.messages[2].tool_results().next().unwrap();
        assert_eq!(result.content, json!({"location": "Paris", "sky": "clear"}));

        let requests = provider.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tool_names, vec!["get_weather"]);
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_recursion_limit_returns_last_response() {
        let provider =
            FunctionProvider::always_tool_call(ProviderKind::OpenAi, "get_weather", json!({"location": "Oslo"}));
        let agent = Agent::builder("looper", provider)
            .tools(weather_tools())
            .max_recursions(3)
            .build();
        let (bus, cancel) = run_args();

        let turn = agent.run("loop", &[], &bus, &cancel).await.unwrap();

        assert!(turn.recursion_exhausted);
        assert_eq!(turn.cycles_used, 3);
        assert!(turn.response.has_tool_use());
        // user + 4 replies + 3 result messages
        assert_eq!(turn.messages.len(), 8);
    }

    #[tokio::test]
    async fn test_zero_recursions_makes_first_response_final() {
        let provider = MockProvider::new(ProviderKind::Bedrock)
            .with_tool_call("get_weather", json!({"location": "Rome"}));
        let agent = Agent::builder("once", provider.clone())
            .tools(weather_tools())
            .max_recursions(0)
            .build();
        let (bus, cancel) = run_args();

        let turn = agent.run("hi", &[], &bus, &cancel).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(turn.cycles_used, 0);
        assert!(turn.recursion_exhausted);
    }

    #[tokio::test]
    async fn test_tool_failure_does_not_abort_turn() {
        let provider = MockProvider::new(ProviderKind::Claude)
            .with_tool_call("no_such_tool", json!({}))
            .with_text_response("Sorry, I could not do that.");
        let agent = Agent::builder("a", provider).tools(weather_tools()).build();
        let (bus, cancel) = run_args();

        let turn = agent.run("do it", &[], &bus, &cancel).await.unwrap();

        let result = turn.messages[2].tool_results().next().unwrap();
        assert!(result.is_error);
        assert_eq!(turn.text(), "Sorry, I could not do that.");
    }

    #[tokio::test]
    async fn test_provider_error_aborts_turn_and_fires_error_hook() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();
        let provider = MockProvider::new(ProviderKind::Claude).with_error("rate limited");
        let agent = Agent::builder("a", provider).build();

        let err = agent
            .run("hi", &[], &bus, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Provider(ProviderError::Rejected(_))));
        assert_eq!(recorder.hooks(), vec!["agent_start", "agent_error"]);
    }

    #[tokio::test]
    async fn test_hooks_wrap_turn_and_tools() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();
        let provider = MockProvider::new(ProviderKind::Claude)
            .with_tool_call("get_weather", json!({"location": "Lima"}))
            .with_text_response("Done.");
        let agent = Agent::builder("weather", provider).tools(weather_tools()).build();

        agent.run("go", &[], &bus, &CancellationToken::new()).await.unwrap();

        assert_eq!(
            recorder.hooks(),
            vec!["agent_start", "tool_start", "tool_end", "agent_end"]
        );
        assert_eq!(
            recorder.events()[3].detail,
            json!({"output": "Done.", "cycles_used": 1, "recursion_exhausted": false})
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let agent = Agent::builder("a", MockProvider::new(ProviderKind::Claude)).build();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = agent.run("hi", &[], &CallbackBus::new(), &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }

    #[tokio::test]
    async fn test_history_is_sent_but_not_returned() {
        let provider = FunctionProvider::new(ProviderKind::Claude, |messages| {
            Ok(ConversationMessage::assistant(format!("seen {}", messages.len())))
        });
        let agent = Agent::builder("a", provider).build();
        let history = vec![
            ConversationMessage::user("earlier"),
            ConversationMessage::new(Role::Assistant, vec![ContentBlock::text("ok")]),
        ];

        let turn = agent
            .run("now", &history, &CallbackBus::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(turn.text(), "seen 3");
        assert_eq!(turn.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_provider_can_fail_with_other_errors() {
        let provider = FunctionProvider::new(ProviderKind::Claude, |_| {
            Err(ProviderError::transport("connection reset", true))
        });
        let agent = Agent::builder("a", provider).build();
        let err = agent
            .run("hi", &[], &CallbackBus::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
