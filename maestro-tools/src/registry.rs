//! Tool registry.
//!
//! A [`ToolRegistry`] is built once from a list of tools and is read-only
//! afterwards, so it can be shared through an `Arc` and resolved from
//! concurrently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use maestro_core::ProviderKind;

use crate::definition::ToolDefinition;
use crate::errors::{ExportError, SchemaError, ToolError};
use crate::export::{to_provider_format, ProviderToolSpec};
use crate::schema::{DeriveOptions, ParameterSource};
use crate::tool::{BoxedTool, FunctionTool, Tool, ToolArgs, ToolResult};

/// Immutable, ordered registry of tools.
///
/// # Example
///
/// ```rust
/// use maestro_core::ProviderKind;
/// use maestro_tools::{DeriveOptions, FunctionSignature, ToolRegistry};
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = ToolRegistry::builder()
///     .function(
///         &FunctionSignature::new("echo").param("text", "String"),
///         &DeriveOptions::new(),
///         |args| async move { Ok(args["text"].clone()) },
///     )?
///     .build()?;
///
/// assert!(registry.contains("echo"));
/// let specs = registry.export_all(ProviderKind::OpenAi)?;
/// assert_eq!(specs[0].to_json()?["function"]["name"], json!("echo"));
/// # Ok(())
/// # }
/// ```
pub struct ToolRegistry {
    tools: Vec<BoxedTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from a list of tools.
    ///
    /// Fails if two tools share a name or a definition is invalid.
    pub fn new(tools: Vec<BoxedTool>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            let definition = tool.definition();
            definition.validate()?;
            if index.insert(definition.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateTool(definition.name.clone()));
            }
        }
        tracing::debug!(tool_count = tools.len(), "Tool registry built");
        Ok(Self { tools, index })
    }

    /// Create an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Start building a registry.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Resolve a tool by name.
    pub fn resolve(&self, name: &str) -> Result<BoxedTool, ToolError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if a tool exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Render every tool in a provider's format, in registration order.
    pub fn export_all(&self, kind: ProviderKind) -> Result<Vec<ProviderToolSpec>, ExportError> {
        self.tools
            .iter()
            .map(|t| to_provider_format(t.definition(), kind))
            .collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Iterate over tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedTool> {
        self.tools.iter()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Collects tools before building a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<BoxedTool>,
}

impl ToolRegistryBuilder {
    /// Add a tool.
    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Add an already shared tool.
    #[must_use]
    pub fn shared(mut self, tool: BoxedTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add an async function, deriving its schema from `source`.
    pub fn function<F, Fut>(
        self,
        source: &dyn ParameterSource,
        options: &DeriveOptions,
        function: F,
    ) -> Result<Self, SchemaError>
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        Ok(self.tool(FunctionTool::derive(source, options, function)?))
    }

    /// Build the registry.
    pub fn build(self) -> Result<ToolRegistry, SchemaError> {
        ToolRegistry::new(self.tools)
    }
}

impl std::fmt::Debug for ToolRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryBuilder")
            .field("tool_count", &self.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ParamType, ParameterSpec};
    use crate::schema::FunctionSignature;
    use crate::tool::SyncFunctionTool;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn named(name: &str) -> SyncFunctionTool<impl Fn(ToolArgs) -> ToolResult + Send + Sync> {
        SyncFunctionTool::new(
            ToolDefinition::new(name, format!("The {name} tool"))
                .with_parameter("x", ParameterSpec::new(ParamType::Integer)),
            |args: ToolArgs| Ok(args["x"].clone()),
        )
    }

    #[test]
    fn test_resolve() {
        let registry = ToolRegistry::builder().tool(named("a")).tool(named("b")).build().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("b").unwrap().name(), "b");
        assert!(matches!(
            registry.resolve("missing"),
            Err(ToolError::NotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = ToolRegistry::builder()
            .tool(named("a"))
            .tool(named("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTool("a".into()));
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let err = ToolRegistry::builder().tool(named("has space")).build().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidName(_)));
    }

    #[test]
    fn test_export_all_keeps_registration_order() {
        let registry = ToolRegistry::builder()
            .tool(named("zeta"))
            .tool(named("alpha"))
            .tool(named("mid"))
            .build()
            .unwrap();

        let names: Vec<String> = registry
            .export_all(ProviderKind::Bedrock)
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_function_builder_derives_schema() {
        let registry = ToolRegistry::builder()
            .function(
                &FunctionSignature::new("double").param("n", "i64"),
                &DeriveOptions::new(),
                |args| async move {
                    let n = args["n"].as_i64().unwrap_or_default();
                    Ok(json!(n * 2))
                },
            )
            .unwrap()
            .build()
            .unwrap();

        let tool = registry.resolve("double").unwrap();
        assert_eq!(tool.definition().parameter("n").unwrap().param_type, ParamType::Integer);

        let mut args = ToolArgs::new();
        args.insert("n".into(), json!(21));
        assert_eq!(tool.call(args).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_concurrent_resolution() {
        let registry = Arc::new(ToolRegistry::builder().tool(named("a")).build().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.resolve("a").map(|t| t.name().to_string()) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "a");
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.export_all(ProviderKind::Claude).unwrap(), Vec::new());
    }
}
