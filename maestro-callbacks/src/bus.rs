//! The callback bus.
//!
//! [`CallbackBus`] holds at most one hook implementation per category and
//! runs them under a [`HookPolicy`]. Whatever a hook does, the bus keeps it
//! away from the caller: panics are caught and logged, slow hooks are cut off
//! at the configured timeout, and a hook can never change the outcome of the
//! operation it observes.

use futures::FutureExt;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use maestro_tools::ToolErrorInfo;

use crate::hooks::{
    AgentCallbacks, AgentEndEvent, AgentErrorEvent, AgentStartEvent, AgentSummary,
    ClassifierCallbacks, ClassifierEndEvent, ClassifierErrorEvent, ClassifierStartEvent,
    ClassifierSummary, HookContext, ToolCallbacks, ToolEndEvent, ToolErrorEvent, ToolStartEvent,
};

/// Default bound on a single awaited hook.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// How hooks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPolicy {
    /// Await each hook inline, giving up after `timeout` if set.
    Await {
        /// Upper bound on a single hook.
        timeout: Option<Duration>,
    },
    /// Spawn each hook on the runtime and move on.
    ///
    /// Start hooks then yield an empty [`HookContext`], and hook ordering
    /// relative to the observed operation is not guaranteed.
    FireAndForget,
}

impl HookPolicy {
    /// Await hooks with the given bound.
    #[must_use]
    pub fn awaited(timeout: Duration) -> Self {
        Self::Await {
            timeout: Some(timeout),
        }
    }

    /// Await hooks with no bound.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::Await { timeout: None }
    }
}

impl Default for HookPolicy {
    fn default() -> Self {
        Self::awaited(DEFAULT_HOOK_TIMEOUT)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Registered hooks plus the policy used to run them.
///
/// Built once before execution and passed by reference to whatever needs to
/// emit events. Cloning is cheap.
///
/// # Example
///
/// ```rust
/// use maestro_callbacks::{CallbackBus, HookPolicy, TracingCallbacks};
/// use std::time::Duration;
///
/// let bus = CallbackBus::builder()
///     .all(TracingCallbacks)
///     .policy(HookPolicy::awaited(Duration::from_millis(500)))
///     .build();
/// assert!(bus.has_tool_callbacks());
/// ```
#[derive(Clone, Default)]
pub struct CallbackBus {
    agent: Option<Arc<dyn AgentCallbacks>>,
    classifier: Option<Arc<dyn ClassifierCallbacks>>,
    tool: Option<Arc<dyn ToolCallbacks>>,
    policy: HookPolicy,
}

impl CallbackBus {
    /// A bus with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a bus.
    #[must_use]
    pub fn builder() -> CallbackBusBuilder {
        CallbackBusBuilder::default()
    }

    /// The execution policy.
    #[must_use]
    pub fn policy(&self) -> HookPolicy {
        self.policy
    }

    /// Whether agent hooks are registered.
    #[must_use]
    pub fn has_agent_callbacks(&self) -> bool {
        self.agent.is_some()
    }

    /// Whether classifier hooks are registered.
    #[must_use]
    pub fn has_classifier_callbacks(&self) -> bool {
        self.classifier.is_some()
    }

    /// Whether tool hooks are registered.
    #[must_use]
    pub fn has_tool_callbacks(&self) -> bool {
        self.tool.is_some()
    }

    async fn run<T, Fut>(&self, category: &'static str, stage: &'static str, hook: Fut) -> Option<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        match self.policy {
            HookPolicy::Await { timeout } => {
                let guarded = AssertUnwindSafe(hook).catch_unwind();
                let outcome = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, guarded).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            tracing::warn!(
                                category,
                                stage,
                                timeout_ms = limit.as_millis() as u64,
                                "Hook timed out"
                            );
                            return None;
                        }
                    },
                    None => guarded.await,
                };
                match outcome {
                    Ok(value) => Some(value),
                    Err(panic) => {
                        tracing::warn!(
                            category,
                            stage,
                            panic = %panic_message(panic.as_ref()),
                            "Hook panicked"
                        );
                        None
                    }
                }
            }
            HookPolicy::FireAndForget => {
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            if let Err(panic) = AssertUnwindSafe(hook).catch_unwind().await {
                                tracing::warn!(
                                    category,
                                    stage,
                                    panic = %panic_message(panic.as_ref()),
                                    "Hook panicked"
                                );
                            }
                        });
                    }
                    Err(_) => {
                        tracing::warn!(category, stage, "No runtime to spawn hook on, skipped");
                    }
                }
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Agent
    // ------------------------------------------------------------------------

    /// Emit `on_agent_start`.
    pub async fn agent_start(&self, event: &AgentStartEvent) -> HookContext {
        let Some(hooks) = self.agent.clone() else {
            return HookContext::empty();
        };
        let event = event.clone();
        self.run("agent", "start", async move { hooks.on_agent_start(&event).await })
            .await
            .unwrap_or_default()
    }

    /// Emit `on_agent_end`.
    pub async fn agent_end(&self, event: &AgentEndEvent, context: &HookContext) {
        let Some(hooks) = self.agent.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("agent", "end", async move {
            hooks.on_agent_end(&event, &context).await;
        })
        .await;
    }

    /// Emit `on_agent_error`.
    pub async fn agent_error(&self, event: &AgentErrorEvent, context: &HookContext) {
        let Some(hooks) = self.agent.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("agent", "error", async move {
            hooks.on_agent_error(&event, &context).await;
        })
        .await;
    }

    /// Run an agent turn between the agent start and end/error hooks.
    ///
    /// `summarize` turns a successful result into the end event summary.
    pub async fn wrap_agent<T, E, Fut, S>(
        &self,
        start: AgentStartEvent,
        operation: Fut,
        summarize: S,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: FnOnce(&T) -> AgentSummary,
    {
        if self.agent.is_none() {
            return operation.await;
        }
        let context = self.agent_start(&start).await;
        let started = Instant::now();
        let outcome = operation.await;
        let elapsed = started.elapsed();
        match &outcome {
            Ok(value) => {
                let event = AgentEndEvent {
                    agent_name: start.agent_name,
                    turn_id: start.turn_id,
                    summary: summarize(value),
                    elapsed,
                };
                self.agent_end(&event, &context).await;
            }
            Err(error) => {
                let event = AgentErrorEvent {
                    agent_name: start.agent_name,
                    turn_id: start.turn_id,
                    error: error.to_string(),
                    elapsed,
                };
                self.agent_error(&event, &context).await;
            }
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Classifier
    // ------------------------------------------------------------------------

    /// Emit `on_classifier_start`.
    pub async fn classifier_start(&self, event: &ClassifierStartEvent) -> HookContext {
        let Some(hooks) = self.classifier.clone() else {
            return HookContext::empty();
        };
        let event = event.clone();
        self.run("classifier", "start", async move {
            hooks.on_classifier_start(&event).await
        })
        .await
        .unwrap_or_default()
    }

    /// Emit `on_classifier_end`.
    pub async fn classifier_end(&self, event: &ClassifierEndEvent, context: &HookContext) {
        let Some(hooks) = self.classifier.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("classifier", "end", async move {
            hooks.on_classifier_end(&event, &context).await;
        })
        .await;
    }

    /// Emit `on_classifier_error`.
    pub async fn classifier_error(&self, event: &ClassifierErrorEvent, context: &HookContext) {
        let Some(hooks) = self.classifier.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("classifier", "error", async move {
            hooks.on_classifier_error(&event, &context).await;
        })
        .await;
    }

    /// Run a classification between the classifier start and end/error hooks.
    pub async fn wrap_classifier<T, E, Fut, S>(
        &self,
        start: ClassifierStartEvent,
        operation: Fut,
        summarize: S,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: FnOnce(&T) -> ClassifierSummary,
    {
        if self.classifier.is_none() {
            return operation.await;
        }
        let context = self.classifier_start(&start).await;
        let started = Instant::now();
        let outcome = operation.await;
        let elapsed = started.elapsed();
        match &outcome {
            Ok(value) => {
                let event = ClassifierEndEvent {
                    input: start.input,
                    summary: summarize(value),
                    elapsed,
                };
                self.classifier_end(&event, &context).await;
            }
            Err(error) => {
                let event = ClassifierErrorEvent {
                    input: start.input,
                    error: error.to_string(),
                    elapsed,
                };
                self.classifier_error(&event, &context).await;
            }
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Tool
    // ------------------------------------------------------------------------

    /// Emit `on_tool_start`.
    pub async fn tool_start(&self, event: &ToolStartEvent) -> HookContext {
        let Some(hooks) = self.tool.clone() else {
            return HookContext::empty();
        };
        let event = event.clone();
        self.run("tool", "start", async move { hooks.on_tool_start(&event).await })
            .await
            .unwrap_or_default()
    }

    /// Emit `on_tool_end`.
    pub async fn tool_end(&self, event: &ToolEndEvent, context: &HookContext) {
        let Some(hooks) = self.tool.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("tool", "end", async move {
            hooks.on_tool_end(&event, &context).await;
        })
        .await;
    }

    /// Emit `on_tool_error`.
    pub async fn tool_error(&self, event: &ToolErrorEvent, context: &HookContext) {
        let Some(hooks) = self.tool.clone() else {
            return;
        };
        let (event, context) = (event.clone(), context.clone());
        self.run("tool", "error", async move {
            hooks.on_tool_error(&event, &context).await;
        })
        .await;
    }

    /// Run a tool invocation between the tool start and end/error hooks.
    ///
    /// Exactly one of `on_tool_end` and `on_tool_error` fires.
    pub async fn wrap_tool<Fut>(
        &self,
        start: ToolStartEvent,
        operation: Fut,
    ) -> Result<JsonValue, ToolErrorInfo>
    where
        Fut: Future<Output = Result<JsonValue, ToolErrorInfo>>,
    {
        if self.tool.is_none() {
            return operation.await;
        }
        let context = self.tool_start(&start).await;
        let started = Instant::now();
        let outcome = operation.await;
        let elapsed = started.elapsed();
        match &outcome {
            Ok(output) => {
                let event = ToolEndEvent {
                    tool_name: start.tool_name,
                    invocation_id: start.invocation_id,
                    output: output.clone(),
                    elapsed,
                };
                self.tool_end(&event, &context).await;
            }
            Err(error) => {
                let event = ToolErrorEvent {
                    tool_name: start.tool_name,
                    invocation_id: start.invocation_id,
                    error: error.clone(),
                    elapsed,
                };
                self.tool_error(&event, &context).await;
            }
        }
        outcome
    }
}

impl std::fmt::Debug for CallbackBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackBus")
            .field("agent", &self.agent.is_some())
            .field("classifier", &self.classifier.is_some())
            .field("tool", &self.tool.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`CallbackBus`].
#[derive(Default)]
pub struct CallbackBusBuilder {
    agent: Option<Arc<dyn AgentCallbacks>>,
    classifier: Option<Arc<dyn ClassifierCallbacks>>,
    tool: Option<Arc<dyn ToolCallbacks>>,
    policy: HookPolicy,
}

impl CallbackBusBuilder {
    /// Set the agent hooks.
    #[must_use]
    pub fn agent<H: AgentCallbacks + 'static>(mut self, hooks: H) -> Self {
        self.agent = Some(Arc::new(hooks));
        self
    }

    /// Set the classifier hooks.
    #[must_use]
    pub fn classifier<H: ClassifierCallbacks + 'static>(mut self, hooks: H) -> Self {
        self.classifier = Some(Arc::new(hooks));
        self
    }

    /// Set the tool hooks.
    #[must_use]
    pub fn tool<H: ToolCallbacks + 'static>(mut self, hooks: H) -> Self {
        self.tool = Some(Arc::new(hooks));
        self
    }

    /// Use one shared implementation for every category.
    #[must_use]
    pub fn all<H>(self, hooks: H) -> Self
    where
        H: AgentCallbacks + ClassifierCallbacks + ToolCallbacks + 'static,
    {
        self.shared(Arc::new(hooks))
    }

    /// Use one already shared implementation for every category.
    #[must_use]
    pub fn shared<H>(mut self, hooks: Arc<H>) -> Self
    where
        H: AgentCallbacks + ClassifierCallbacks + ToolCallbacks + 'static,
    {
        self.agent = Some(hooks.clone());
        self.classifier = Some(hooks.clone());
        self.tool = Some(hooks);
        self
    }

    /// Set the execution policy.
    #[must_use]
    pub fn policy(mut self, policy: HookPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the bus.
    #[must_use]
    pub fn build(self) -> CallbackBus {
        CallbackBus {
            agent: self.agent,
            classifier: self.classifier,
            tool: self.tool,
            policy: self.policy,
        }
    }
}

impl std::fmt::Debug for CallbackBusBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackBusBuilder")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingCallbacks;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    struct PanickingHooks;

    #[async_trait]
    impl ToolCallbacks for PanickingHooks {
        async fn on_tool_start(&self, _event: &ToolStartEvent) -> HookContext {
            panic!("start hook exploded");
        }

        async fn on_tool_end(&self, _event: &ToolEndEvent, _context: &HookContext) {
            panic!("end hook exploded");
        }
    }

    struct SlowHooks;

    #[async_trait]
    impl ToolCallbacks for SlowHooks {
        async fn on_tool_start(&self, _event: &ToolStartEvent) -> HookContext {
            tokio::time::sleep(Duration::from_secs(30)).await;
            HookContext::new(json!("never"))
        }
    }

    fn start() -> ToolStartEvent {
        ToolStartEvent::new("get_weather", "call_1", json!({"location": "Paris"}))
    }

    #[tokio::test]
    async fn test_wrap_tool_success_fires_start_and_end() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();

        let result = bus.wrap_tool(start(), async { Ok(json!(21)) }).await;

        assert_eq!(result, Ok(json!(21)));
        assert_eq!(recorder.hooks(), vec!["tool_start", "tool_end"]);
        let events = recorder.events();
        assert_eq!(events[1].subject, "get_weather");
        assert_eq!(events[1].detail, json!(21));
        assert_eq!(events[1].context, events[0].context);
    }

    #[tokio::test]
    async fn test_wrap_tool_failure_fires_error_only() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();

        let info = ToolErrorInfo::new("callable_fault", "boom");
        let result = bus.wrap_tool(start(), async { Err(info.clone()) }).await;

        assert_eq!(result, Err(info));
        assert_eq!(recorder.hooks(), vec!["tool_start", "tool_error"]);
        assert_eq!(recorder.count("tool_end"), 0);
    }

    #[rstest]
    #[case::awaited(HookPolicy::awaited(Duration::from_millis(50)))]
    #[case::unbounded(HookPolicy::unbounded())]
    #[case::fire_and_forget(HookPolicy::FireAndForget)]
    #[tokio::test]
    async fn test_panicking_hooks_are_contained(#[case] policy: HookPolicy) {
        let bus = CallbackBus::builder()
            .tool(PanickingHooks)
            .policy(policy)
            .build();

        let result = bus.wrap_tool(start(), async { Ok(json!("ok")) }).await;
        assert_eq!(result, Ok(json!("ok")));

        let info = ToolErrorInfo::new("timeout", "too slow");
        let result = bus.wrap_tool(start(), async { Err(info.clone()) }).await;
        assert_eq!(result, Err(info));
    }

    #[tokio::test]
    async fn test_slow_hook_is_cut_off() {
        let bus = CallbackBus::builder()
            .tool(SlowHooks)
            .policy(HookPolicy::awaited(Duration::from_millis(20)))
            .build();

        let started = Instant::now();
        let context = bus.tool_start(&start()).await;

        assert!(context.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fire_and_forget_yields_empty_context() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder()
            .shared(recorder.clone())
            .policy(HookPolicy::FireAndForget)
            .build();

        let context = bus.tool_start(&start()).await;
        assert!(context.is_empty());

        for _ in 0..100 {
            if recorder.count("tool_start") == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(recorder.count("tool_start"), 1);
    }

    #[rstest]
    #[case::awaited(HookPolicy::awaited(Duration::from_millis(20)))]
    #[case::fire_and_forget(HookPolicy::FireAndForget)]
    #[tokio::test]
    async fn test_bounded_policies_do_not_wait_for_slow_hooks(#[case] policy: HookPolicy) {
        let bus = CallbackBus::builder().tool(SlowHooks).policy(policy).build();

        let started = Instant::now();
        let result = bus.wrap_tool(start(), async { Ok(json!(1)) }).await;
        assert_eq!(result, Ok(json!(1)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wrap_agent_reports_error_text() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();

        let result: Result<(), String> = bus
            .wrap_agent(
                AgentStartEvent::new("weather", "turn_1", "hi"),
                async { Err("provider down".to_string()) },
                |_| AgentSummary::default(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(recorder.hooks(), vec!["agent_start", "agent_error"]);
        assert_eq!(recorder.events()[1].detail, json!("provider down"));
    }

    #[tokio::test]
    async fn test_wrap_classifier_summary() {
        let recorder = Arc::new(RecordingCallbacks::new());
        let bus = CallbackBus::builder().shared(recorder.clone()).build();

        let chosen: Result<&str, String> = bus
            .wrap_classifier(
                ClassifierStartEvent::new("weather in Paris?", vec!["weather".into()]),
                async { Ok("weather") },
                |name| ClassifierSummary {
                    selected_agent: Some((*name).to_string()),
                    confidence: 0.9,
                },
            )
            .await;

        assert_eq!(chosen, Ok("weather"));
        assert_eq!(recorder.hooks(), vec!["classifier_start", "classifier_end"]);
        assert_eq!(recorder.events()[1].subject, "weather");
    }

    #[tokio::test]
    async fn test_empty_bus_passes_through() {
        let bus = CallbackBus::new();
        assert!(!bus.has_tool_callbacks());
        assert_eq!(bus.policy(), HookPolicy::awaited(DEFAULT_HOOK_TIMEOUT));
        let result = bus.wrap_tool(start(), async { Ok(json!(null)) }).await;
        assert_eq!(result, Ok(json!(null)));
    }
}
