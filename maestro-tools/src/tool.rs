//! Core tool trait and implementations.
//!
//! This module provides the `Tool` trait which all tools must implement,
//! as well as the `FunctionTool` and `SyncFunctionTool` wrappers for
//! closure-based tools.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::definition::ToolDefinition;
use crate::errors::{SchemaError, ToolError};
use crate::schema::{DeriveOptions, ParameterSource, SchemaDeriver};

/// Named arguments passed to a tool.
pub type ToolArgs = serde_json::Map<String, JsonValue>;

/// Result of a tool call.
pub type ToolResult = Result<JsonValue, ToolError>;

/// Core trait for all tools.
///
/// A tool pairs a [`ToolDefinition`] with the callable that implements it.
/// Arguments reach [`Tool::call`] already validated against the definition,
/// with omitted optional parameters filled from their defaults.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use maestro_tools::{ParamType, ParameterSpec, Tool, ToolArgs, ToolDefinition, ToolResult};
/// use serde_json::json;
///
/// struct GreetTool {
///     definition: ToolDefinition,
/// }
///
/// #[async_trait]
/// impl Tool for GreetTool {
///     fn definition(&self) -> &ToolDefinition {
///         &self.definition
///     }
///
///     async fn call(&self, args: ToolArgs) -> ToolResult {
///         let name = args.get("name").and_then(|v| v.as_str()).unwrap_or("World");
///         Ok(json!(format!("Hello, {name}!")))
///     }
/// }
///
/// let tool = GreetTool {
///     definition: ToolDefinition::new("greet", "Greet someone")
///         .with_parameter("name", ParameterSpec::new(ParamType::String)),
/// };
/// assert_eq!(tool.name(), "greet");
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's definition.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with validated arguments.
    async fn call(&self, args: ToolArgs) -> ToolResult;

    /// Per-tool timeout, overriding the dispatcher default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Get the tool name.
    fn name(&self) -> &str {
        &self.definition().name
    }
}

/// Type-erased shared tool.
pub type BoxedTool = Arc<dyn Tool>;

/// Wrapper for async function-based tools.
///
/// # Example
///
/// ```rust
/// use maestro_tools::{DeriveOptions, FunctionSignature, FunctionTool, Tool};
/// use serde_json::json;
///
/// # fn main() -> Result<(), maestro_tools::SchemaError> {
/// let tool = FunctionTool::derive(
///     &FunctionSignature::new("add").param("a", "f64").param("b", "f64"),
///     &DeriveOptions::new().with_description("Add two numbers"),
///     |args| async move {
///         let a = args["a"].as_f64().unwrap_or(0.0);
///         let b = args["b"].as_f64().unwrap_or(0.0);
///         Ok(json!(a + b))
///     },
/// )?;
/// assert_eq!(tool.definition().required_parameters(), vec!["a", "b"]);
/// # Ok(())
/// # }
/// ```
pub struct FunctionTool<F> {
    definition: ToolDefinition,
    function: F,
    timeout: Option<Duration>,
}

impl<F> FunctionTool<F> {
    /// Create a function tool from an existing definition.
    pub fn new<Fut>(definition: ToolDefinition, function: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync,
        Fut: Future<Output = ToolResult> + Send,
    {
        Self {
            definition,
            function,
            timeout: None,
        }
    }

    /// Create a function tool, deriving its definition from a source.
    pub fn derive<Fut>(
        source: &dyn ParameterSource,
        options: &DeriveOptions,
        function: F,
    ) -> Result<Self, SchemaError>
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync,
        Fut: Future<Output = ToolResult> + Send,
    {
        Ok(Self::new(SchemaDeriver::derive(source, options)?, function))
    }

    /// Set a per-tool timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<F, Fut> Tool for FunctionTool<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult> + Send,
{
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, args: ToolArgs) -> ToolResult {
        (self.function)(args).await
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<F> std::fmt::Debug for FunctionTool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.definition.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Wrapper for sync function tools.
///
/// For tools that don't need async, this provides a simpler API.
pub struct SyncFunctionTool<F> {
    definition: ToolDefinition,
    function: F,
    timeout: Option<Duration>,
}

impl<F> SyncFunctionTool<F>
where
    F: Fn(ToolArgs) -> ToolResult + Send + Sync,
{
    /// Create a sync function tool from an existing definition.
    pub fn new(definition: ToolDefinition, function: F) -> Self {
        Self {
            definition,
            function,
            timeout: None,
        }
    }

    /// Create a sync function tool, deriving its definition from a source.
    pub fn derive(
        source: &dyn ParameterSource,
        options: &DeriveOptions,
        function: F,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(SchemaDeriver::derive(source, options)?, function))
    }

    /// Set a per-tool timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<F> Tool for SyncFunctionTool<F>
where
    F: Fn(ToolArgs) -> ToolResult + Send + Sync,
{
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, args: ToolArgs) -> ToolResult {
        (self.function)(args)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<F> std::fmt::Debug for SyncFunctionTool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFunctionTool")
            .field("name", &self.definition.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}
