//! Orchestrator configuration.
//!
//! Every field has a default, so a configuration can be built in code,
//! deserialized from a partial JSON document or read from `MAESTRO_*`
//! environment variables.

use maestro_callbacks::HookPolicy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::recursion::DEFAULT_MAX_RECURSIONS;

/// Prefix of the environment variables read by [`OrchestratorConfig::from_env`].
pub const ENV_PREFIX: &str = "MAESTRO_";

/// How the requests of one batch are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// One after another, in request order.
    #[default]
    Sequential,
    /// Concurrently. Results still come back in request order.
    Parallel,
}

impl FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!("unknown dispatch policy '{other}'")),
        }
    }
}

/// How lifecycle hooks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    /// Await each hook, bounded by `hook_timeout_ms`.
    #[default]
    Await,
    /// Spawn hooks and do not wait for them.
    FireAndForget,
}

impl FromStr for HookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "await" => Ok(Self::Await),
            "fire_and_forget" | "fire-and-forget" => Ok(Self::FireAndForget),
            other => Err(format!("unknown hook mode '{other}'")),
        }
    }
}

/// Settings shared by agents and the orchestrator.
///
/// # Example
///
/// ```rust
/// use maestro_agent::{DispatchPolicy, OrchestratorConfig};
///
/// let config = OrchestratorConfig::from_json_str(r#"{"dispatch_policy": "parallel"}"#).unwrap();
/// assert_eq!(config.dispatch_policy, DispatchPolicy::Parallel);
/// assert_eq!(config.max_recursions, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Tool-call batches allowed per turn.
    pub max_recursions: u32,
    /// How requests within a batch are executed.
    pub dispatch_policy: DispatchPolicy,
    /// Cap on concurrently running tools under the parallel policy.
    pub max_concurrent_tools: Option<usize>,
    /// Default per-tool timeout in milliseconds. Tools may override it.
    pub tool_timeout_ms: Option<u64>,
    /// Bound on a single awaited hook, in milliseconds.
    pub hook_timeout_ms: Option<u64>,
    /// How hooks are executed.
    pub hook_mode: HookMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_recursions: DEFAULT_MAX_RECURSIONS,
            dispatch_policy: DispatchPolicy::default(),
            max_concurrent_tools: None,
            tool_timeout_ms: None,
            hook_timeout_ms: Some(5_000),
            hook_mode: HookMode::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recursion limit.
    #[must_use]
    pub fn with_max_recursions(mut self, max: u32) -> Self {
        self.max_recursions = max;
        self
    }

    /// Set the dispatch policy.
    #[must_use]
    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch_policy = policy;
        self
    }

    /// Cap concurrently running tools under the parallel policy.
    #[must_use]
    pub fn with_max_concurrent_tools(mut self, max: usize) -> Self {
        self.max_concurrent_tools = Some(max);
        self
    }

    /// Set the default per-tool timeout.
    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the hook timeout.
    #[must_use]
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the hook mode.
    #[must_use]
    pub fn with_hook_mode(mut self, mode: HookMode) -> Self {
        self.hook_mode = mode;
        self
    }

    /// Default per-tool timeout.
    #[must_use]
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_ms.map(Duration::from_millis)
    }

    /// Hook policy for a [`CallbackBus`](maestro_callbacks::CallbackBus).
    #[must_use]
    pub fn hook_policy(&self) -> HookPolicy {
        match self.hook_mode {
            HookMode::Await => HookPolicy::Await {
                timeout: self.hook_timeout_ms.map(Duration::from_millis),
            },
            HookMode::FireAndForget => HookPolicy::FireAndForget,
        }
    }

    /// Check the values for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_tools == Some(0) {
            return Err(ConfigError::invalid(
                "max_concurrent_tools",
                "must be at least 1",
            ));
        }
        if self.tool_timeout_ms == Some(0) {
            return Err(ConfigError::invalid("tool_timeout_ms", "must be positive"));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `MAESTRO_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = env_value(&lookup, "MAX_RECURSIONS")? {
            config.max_recursions = v;
        }
        if let Some(v) = env_value(&lookup, "DISPATCH_POLICY")? {
            config.dispatch_policy = v;
        }
        if let Some(v) = env_value(&lookup, "MAX_CONCURRENT_TOOLS")? {
            config.max_concurrent_tools = Some(v);
        }
        if let Some(v) = env_value(&lookup, "TOOL_TIMEOUT_MS")? {
            config.tool_timeout_ms = Some(v);
        }
        if let Some(v) = env_value(&lookup, "HOOK_TIMEOUT_MS")? {
            config.hook_timeout_ms = Some(v);
        }
        if let Some(v) = env_value(&lookup, "HOOK_MODE")? {
            config.hook_mode = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn env_value<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{ENV_PREFIX}{name}");
    match lookup(&key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value: raw }),
    }
}
