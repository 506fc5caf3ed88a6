//! Routing inputs to agents.
//!
//! The [`Orchestrator`] asks its [`Classifier`] which agent should handle an
//! input, then runs that agent's turn. Classifier hooks surround the
//! classification and agent hooks surround the turn, all on the same bus.

use indexmap::IndexMap;
use maestro_callbacks::{
    AgentCallbacks, CallbackBus, CallbackBusBuilder, ClassifierCallbacks, ClassifierStartEvent,
    ClassifierSummary, ToolCallbacks,
};
use maestro_core::ConversationMessage;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, TurnResult};
use crate::classifier::{AgentProfile, Classifier, ClassifierResult};
use crate::config::OrchestratorConfig;
use crate::errors::{AgentError, ConfigError};

/// Outcome of a routed request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorResponse {
    /// Agent that handled the request.
    pub agent_name: String,
    /// What the classifier returned.
    pub classification: ClassifierResult,
    /// Whether the default agent was used because nothing was selected.
    pub used_default: bool,
    /// The agent's turn.
    pub turn: TurnResult,
}

impl OrchestratorResponse {
    /// Text of the agent's last reply.
    #[must_use]
    pub fn text(&self) -> String {
        self.turn.text()
    }
}

/// Classifies inputs and hands them to the chosen agent.
///
/// # Example
///
/// ```rust
/// use maestro_agent::{Agent, FixedClassifier, MockProvider, Orchestrator};
/// use maestro_core::ProviderKind;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Orchestrator::builder(FixedClassifier::selecting("billing"))
///     .agent(Agent::builder("billing", MockProvider::new(ProviderKind::Claude)
///         .with_text_response("Your invoice is on its way.")).build())
///     .build()?;
///
/// let response = orchestrator
///     .route_request("Where is my invoice?", &[], &CancellationToken::new())
///     .await?;
/// assert_eq!(response.agent_name, "billing");
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    agents: IndexMap<String, Arc<Agent>>,
    classifier: Arc<dyn Classifier>,
    default_agent: Option<String>,
    bus: CallbackBus,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Start building an orchestrator around a classifier.
    pub fn builder<C: Classifier + 'static>(classifier: C) -> OrchestratorBuilder {
        OrchestratorBuilder::new(Arc::new(classifier))
    }

    /// Registered agent by name.
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents.get(name)
    }

    /// Agent names in registration order.
    #[must_use]
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// The callback bus.
    #[must_use]
    pub fn bus(&self) -> &CallbackBus {
        &self.bus
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn profiles(&self) -> Vec<AgentProfile> {
        self.agents
            .values()
            .map(|agent| AgentProfile {
                name: agent.name().to_string(),
                description: agent.description().to_string(),
            })
            .collect()
    }

    /// Classify `input` and run the selected agent.
    ///
    /// Falls back to the default agent when the classifier selects nothing.
    pub async fn route_request(
        &self,
        input: &str,
        history: &[ConversationMessage],
        cancel: &CancellationToken,
    ) -> Result<OrchestratorResponse, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let profiles = self.profiles();
        let start = ClassifierStartEvent::new(
            input,
            profiles.iter().map(|p| p.name.clone()).collect(),
        );
        let classification = self
            .bus
            .wrap_classifier(
                start,
                self.classifier.classify(input, history, &profiles),
                |result: &ClassifierResult| ClassifierSummary {
                    selected_agent: result.selected_agent.clone(),
                    confidence: result.confidence,
                },
            )
            .await?;

        let (agent_name, used_default) = match &classification.selected_agent {
            Some(name) => (name.clone(), false),
            None => match &self.default_agent {
                Some(name) => (name.clone(), true),
                None => return Err(AgentError::NoAgentSelected),
            },
        };
        let agent = self
            .agents
            .get(&agent_name)
            .ok_or_else(|| AgentError::UnknownAgent(agent_name.clone()))?;

        tracing::info!(
            agent_name = %agent_name,
            confidence = classification.confidence,
            used_default,
            "Request routed"
        );

        let turn = agent.run(input, history, &self.bus, cancel).await?;
        Ok(OrchestratorResponse {
            agent_name,
            classification,
            used_default,
            turn,
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("agents", &self.agent_names())
            .field("default_agent", &self.default_agent)
            .field("bus", &self.bus)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    agents: Vec<Agent>,
    classifier: Arc<dyn Classifier>,
    default_agent: Option<String>,
    bus: Option<BusSource>,
    config: OrchestratorConfig,
}

/// Where the orchestrator's bus comes from.
enum BusSource {
    /// Hooks still waiting for the final hook policy.
    Hooks(CallbackBusBuilder),
    /// A bus built by the caller.
    Built(CallbackBus),
}

impl OrchestratorBuilder {
    /// Create a builder around a classifier.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            agents: Vec::new(),
            classifier,
            default_agent: None,
            bus: None,
            config: OrchestratorConfig::default(),
        }
    }

    /// Register an agent.
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Agent used when the classifier selects nothing.
    #[must_use]
    pub fn default_agent(mut self, name: impl Into<String>) -> Self {
        self.default_agent = Some(name.into());
        self
    }

    /// Use one hook implementation for every category, run under the
    /// configured hook policy.
    #[must_use]
    pub fn callbacks<H>(self, hooks: H) -> Self
    where
        H: AgentCallbacks + ClassifierCallbacks + ToolCallbacks + 'static,
    {
        self.shared_callbacks(Arc::new(hooks))
    }

    /// Like [`callbacks`](Self::callbacks), for an already shared implementation.
    #[must_use]
    pub fn shared_callbacks<H>(mut self, hooks: Arc<H>) -> Self
    where
        H: AgentCallbacks + ClassifierCallbacks + ToolCallbacks + 'static,
    {
        self.bus = Some(BusSource::Hooks(CallbackBus::builder().shared(hooks)));
        self
    }

    /// Use a fully built bus, policy included.
    #[must_use]
    pub fn bus(mut self, bus: CallbackBus) -> Self {
        self.bus = Some(BusSource::Built(bus));
        self
    }

    /// Set the configuration.
    ///
    /// Its hook policy applies to hooks given through
    /// [`callbacks`](Self::callbacks), and its recursion and dispatch
    /// settings to every agent that did not set its own.
    #[must_use]
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator.
    ///
    /// Fails on invalid configuration, duplicate agent names or an unknown
    /// default agent.
    pub fn build(self) -> Result<Orchestrator, AgentError> {
        self.config.validate()?;

        let mut agents = IndexMap::with_capacity(self.agents.len());
        for mut agent in self.agents {
            agent.apply_config(&self.config);
            let name = agent.name().to_string();
            if agents.insert(name.clone(), Arc::new(agent)).is_some() {
                return Err(ConfigError::invalid("agents", format!("duplicate agent '{name}'")).into());
            }
        }
        if let Some(default) = &self.default_agent {
            if !agents.contains_key(default) {
                return Err(ConfigError::invalid(
                    "default_agent",
                    format!("no agent named '{default}'"),
                )
                .into());
            }
        }

        let bus = match self.bus {
            Some(BusSource::Built(bus)) => bus,
            Some(BusSource::Hooks(hooks)) => hooks.policy(self.config.hook_policy()).build(),
            None => CallbackBus::builder().policy(self.config.hook_policy()).build(),
        };

        Ok(Orchestrator {
            agents,
            classifier: self.classifier,
            default_agent: self.default_agent,
            bus,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchPolicy, HookMode};
    use crate::errors::ClassifierError;
    use crate::mock::{FixedClassifier, FunctionProvider, MockProvider};
    use maestro_callbacks::{HookPolicy, RecordingCallbacks};
    use maestro_core::ProviderKind;
    use maestro_tools::{DeriveOptions, FunctionSignature, ToolRegistry};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn looping_agent(name: &str) -> crate::agent::AgentBuilder {
        let tools = ToolRegistry::builder()
            .function(&FunctionSignature::new("ping"), &DeriveOptions::new(), |_| async {
                Ok(json!("pong"))
            })
            .unwrap()
            .build()
            .unwrap();
        Agent::builder(
            name,
            FunctionProvider::always_tool_call(ProviderKind::Claude, "ping", json!({})),
        )
        .tools(tools)
    }

    fn agent(name: &str, reply: &str) -> Agent {
        Agent::builder(name, MockProvider::new(ProviderKind::Claude).with_text_response(reply))
            .description(format!("The {name} agent"))
            .build()
    }

    #[tokio::test]
    async fn test_routes_to_selected_agent() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let orchestrator = Orchestrator::builder(FixedClassifier::selecting("tech"))
            .agent(agent("billing", "invoice"))
            .agent(agent("tech", "reboot it"))
            .shared_callbacks(recorder.clone())
            .build()
            .unwrap();

        let response = orchestrator
            .route_request("it broke", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.agent_name, "tech");
        assert_eq!(response.text(), "reboot it");
        assert!(!response.used_default);
        assert_eq!(
            recorder.hooks(),
            vec!["classifier_start", "classifier_end", "agent_start", "agent_end"]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_default_agent() {
        let orchestrator = Orchestrator::builder(FixedClassifier::none())
            .agent(agent("general", "hello"))
            .default_agent("general")
            .build()
            .unwrap();

        let response = orchestrator
            .route_request("hm", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(response.used_default);
        assert_eq!(response.agent_name, "general");
    }

    #[tokio::test]
    async fn test_no_selection_without_default() {
        let orchestrator = Orchestrator::builder(FixedClassifier::none())
            .agent(agent("general", "hello"))
            .build()
            .unwrap();

        let err = orchestrator
            .route_request("hm", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoAgentSelected));
    }

    #[tokio::test]
    async fn test_unknown_selection() {
        let orchestrator = Orchestrator::builder(FixedClassifier::selecting("ghost"))
            .agent(agent("general", "hello"))
            .build()
            .unwrap();

        let err = orchestrator
            .route_request("boo", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownAgent(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_classifier_failure_fires_error_hook() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let orchestrator = Orchestrator::builder(FixedClassifier::failing("model offline"))
            .agent(agent("general", "hello"))
            .shared_callbacks(recorder.clone())
            .build()
            .unwrap();

        let err = orchestrator
            .route_request("hi", &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Classifier(ClassifierError::Failed(_))));
        assert_eq!(recorder.hooks(), vec!["classifier_start", "classifier_error"]);
    }

    #[test]
    fn test_build_rejects_bad_setup() {
        let duplicate = Orchestrator::builder(FixedClassifier::none())
            .agent(agent("a", "x"))
            .agent(agent("a", "y"))
            .build();
        assert!(matches!(duplicate, Err(AgentError::Config(_))));

        let missing_default = Orchestrator::builder(FixedClassifier::none())
            .agent(agent("a", "x"))
            .default_agent("b")
            .build();
        assert!(matches!(missing_default, Err(AgentError::Config(_))));

        let bad_config = Orchestrator::builder(FixedClassifier::none())
            .config(OrchestratorConfig::new().with_max_concurrent_tools(0))
            .build();
        assert!(matches!(bad_config, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_bus_follows_config_policy() {
        let orchestrator = Orchestrator::builder(FixedClassifier::none())
            .config(OrchestratorConfig::new().with_hook_mode(crate::config::HookMode::FireAndForget))
            .callbacks(RecordingCallbacks::new())
            .build()
            .unwrap();
        assert_eq!(
            orchestrator.bus().policy(),
            maestro_callbacks::HookPolicy::FireAndForget
        );
    }

    #[tokio::test]
    async fn test_config_recursion_limit_reaches_agents() {
        let orchestrator = Orchestrator::builder(FixedClassifier::selecting("looper"))
            .config(OrchestratorConfig::new().with_max_recursions(0))
            .agent(looping_agent("looper").build())
            .build()
            .unwrap();

        let response = orchestrator
            .route_request("go", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.turn.cycles_used, 0);
        assert!(response.turn.recursion_exhausted);
    }

    #[tokio::test]
    async fn test_agent_settings_override_config() {
        let orchestrator = Orchestrator::builder(FixedClassifier::selecting("looper"))
            .config(OrchestratorConfig::new().with_max_recursions(0))
            .agent(looping_agent("looper").max_recursions(2).build())
            .agent(
                looping_agent("pinned")
                    .config(&OrchestratorConfig::new().with_max_recursions(1))
                    .build(),
            )
            .build()
            .unwrap();

        let response = orchestrator
            .route_request("go", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.turn.cycles_used, 2);
        assert_eq!(orchestrator.agent("pinned").unwrap().max_recursions(), 1);
    }

    #[test]
    fn test_config_dispatch_settings_reach_agents() {
        let config = OrchestratorConfig::new()
            .with_dispatch_policy(DispatchPolicy::Parallel)
            .with_max_concurrent_tools(3)
            .with_tool_timeout(Duration::from_millis(250));
        let orchestrator = Orchestrator::builder(FixedClassifier::none())
            .agent(looping_agent("inherits").build())
            .agent(
                looping_agent("sequential")
                    .dispatch_policy(DispatchPolicy::Sequential)
                    .build(),
            )
            .config(config)
            .build()
            .unwrap();

        let inherits = orchestrator.agent("inherits").unwrap().dispatcher();
        assert_eq!(inherits.policy(), DispatchPolicy::Parallel);
        assert_eq!(inherits.max_concurrent_tools(), Some(3));
        assert_eq!(inherits.default_timeout(), Some(Duration::from_millis(250)));

        let sequential = orchestrator.agent("sequential").unwrap().dispatcher();
        assert_eq!(sequential.policy(), DispatchPolicy::Sequential);
        assert_eq!(sequential.max_concurrent_tools(), Some(3));
    }

    #[test]
    fn test_hook_policy_independent_of_builder_order() {
        let config = OrchestratorConfig::new().with_hook_mode(HookMode::FireAndForget);

        let callbacks_first = Orchestrator::builder(FixedClassifier::none())
            .callbacks(RecordingCallbacks::new())
            .config(config.clone())
            .build()
            .unwrap();
        let config_first = Orchestrator::builder(FixedClassifier::none())
            .config(config)
            .callbacks(RecordingCallbacks::new())
            .build()
            .unwrap();

        for orchestrator in [&callbacks_first, &config_first] {
            assert_eq!(orchestrator.bus().policy(), HookPolicy::FireAndForget);
            assert!(orchestrator.bus().has_tool_callbacks());
        }
    }

    #[test]
    fn test_explicit_bus_keeps_its_policy() {
        let bus = CallbackBus::builder()
            .policy(HookPolicy::unbounded())
            .build();
        let orchestrator = Orchestrator::builder(FixedClassifier::none())
            .bus(bus)
            .config(OrchestratorConfig::new().with_hook_mode(HookMode::FireAndForget))
            .build()
            .unwrap();
        assert_eq!(orchestrator.bus().policy(), HookPolicy::unbounded());
    }
}
