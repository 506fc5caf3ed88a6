//! # maestro-tools
//!
//! Tool system for maestro agents.
//!
//! This crate turns callables into provider-ready tool declarations and
//! keeps them in an immutable registry for dispatch.
//!
//! ## Core Concepts
//!
//! - **[`SchemaDeriver`]**: Build a [`ToolDefinition`] from a [`ParameterSource`]
//! - **[`to_provider_format`]**: Render a definition for Claude, Bedrock or OpenAI
//! - **[`Tool`]**: Trait pairing a definition with its callable
//! - **[`ToolRegistry`]**: Immutable, ordered name-to-tool map
//! - **[`validate_arguments`]**: Check model-supplied arguments against a definition
//!
//! ## Defining Tools
//!
//! ```rust
//! use maestro_core::ProviderKind;
//! use maestro_tools::{
//!     to_provider_format, DeriveOptions, FunctionSignature, SchemaDeriver,
//! };
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let signature = FunctionSignature::new("get_weather")
//!     .with_docs("Get the current weather.\n\n:param location: City name")
//!     .param("location", "String")
//!     .param_with_default("units", "String", json!("metric"));
//!
//! let definition = SchemaDeriver::derive(
//!     &signature,
//!     &DeriveOptions::new().with_enum("units", vec![json!("metric"), json!("imperial")]),
//! )?;
//!
//! let claude = to_provider_format(&definition, ProviderKind::Claude)?.to_json()?;
//! assert_eq!(claude["input_schema"]["required"], json!(["location"]));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod definition;
pub mod docs;
pub mod errors;
pub mod export;
pub mod registry;
pub mod schema;
pub mod tool;
pub mod validate;

pub use definition::{validate_tool_name, ObjectJsonSchema, ParamType, ParameterSpec, ToolDefinition};
pub use docs::{parse_docs, ParsedDocs};
pub use errors::{ExportError, SchemaError, ToolError, ToolErrorInfo};
pub use export::{
    to_provider_format, to_provider_format_named, BedrockTool, ClaudeTool, OpenAiTool,
    ProviderToolSpec,
};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::{
    infer_type, DeriveOptions, FunctionSignature, ParameterDescriptor, ParameterSource,
    PropertyOverride, SchemaDeriver, TypeHint,
};
pub use tool::{BoxedTool, FunctionTool, SyncFunctionTool, Tool, ToolArgs, ToolResult};
pub use validate::validate_arguments;

// Re-exported for code generated by `#[tool]`.
#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use serde_json;
}

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        DeriveOptions, FunctionSignature, FunctionTool, ParamType, ParameterSpec, SchemaDeriver,
        SyncFunctionTool, Tool, ToolArgs, ToolDefinition, ToolError, ToolRegistry, ToolResult,
    };
}
