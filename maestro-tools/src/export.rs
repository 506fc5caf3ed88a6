//! Provider-specific tool declaration formats.
//!
//! Each supported provider has a typed representation that serializes to the
//! exact JSON its API expects:
//!
//! | Provider | Shape |
//! |----------|-------|
//! | Claude   | `{"name", "description", "input_schema"}` |
//! | Bedrock  | `{"toolSpec": {"name", "description", "inputSchema": {"json"}}}` |
//! | OpenAI   | `{"type": "function", "function": {"name", "description", "parameters"}}` |
//!
//! Exporting never touches the source [`ToolDefinition`].

use indexmap::IndexMap;
use maestro_core::ProviderKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::definition::{ObjectJsonSchema, ParameterSpec, ToolDefinition};
use crate::errors::ExportError;

/// Claude tool declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Parameter schema.
    pub input_schema: ObjectJsonSchema,
}

/// Bedrock Converse tool declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockTool {
    /// Tool specification.
    pub tool_spec: BedrockToolSpec,
}

/// Bedrock tool specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolSpec {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Input schema wrapper.
    pub input_schema: BedrockInputSchema,
}

/// Bedrock input schema wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedrockInputSchema {
    /// The JSON schema.
    pub json: ObjectJsonSchema,
}

/// OpenAI function tool declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiTool {
    /// Always `function`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition.
    pub function: OpenAiFunction,
}

/// OpenAI function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiFunction {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// Parameter schema.
    pub parameters: ObjectJsonSchema,
}

/// A tool declaration in one provider's format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderToolSpec {
    /// Claude format.
    Claude(ClaudeTool),
    /// Bedrock format.
    Bedrock(BedrockTool),
    /// OpenAI format.
    OpenAi(OpenAiTool),
}

impl ProviderToolSpec {
    /// Provider this spec is formatted for.
    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Claude(_) => ProviderKind::Claude,
            Self::Bedrock(_) => ProviderKind::Bedrock,
            Self::OpenAi(_) => ProviderKind::OpenAi,
        }
    }

    /// Serialize to the provider's JSON.
    pub fn to_json(&self) -> Result<JsonValue, ExportError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a previously exported document.
    pub fn from_json(kind: ProviderKind, value: &JsonValue) -> Result<Self, ExportError> {
        let malformed = |e: serde_json::Error| ExportError::Malformed {
            provider: kind.to_string(),
            message: e.to_string(),
        };
        let spec = match kind {
            ProviderKind::Claude => Self::Claude(
                serde_json::from_value(value.clone()).map_err(malformed)?,
            ),
            ProviderKind::Bedrock => Self::Bedrock(
                serde_json::from_value(value.clone()).map_err(malformed)?,
            ),
            ProviderKind::OpenAi => {
                let tool: OpenAiTool = serde_json::from_value(value.clone()).map_err(malformed)?;
                if tool.tool_type != "function" {
                    return Err(ExportError::Malformed {
                        provider: kind.to_string(),
                        message: format!("unexpected tool type '{}'", tool.tool_type),
                    });
                }
                Self::OpenAi(tool)
            }
        };
        Ok(spec)
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Claude(t) => &t.name,
            Self::Bedrock(t) => &t.tool_spec.name,
            Self::OpenAi(t) => &t.function.name,
        }
    }

    /// Tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Claude(t) => &t.description,
            Self::Bedrock(t) => &t.tool_spec.description,
            Self::OpenAi(t) => &t.function.description,
        }
    }

    /// Parameter schema.
    #[must_use]
    pub fn schema(&self) -> &ObjectJsonSchema {
        match self {
            Self::Claude(t) => &t.input_schema,
            Self::Bedrock(t) => &t.tool_spec.input_schema.json,
            Self::OpenAi(t) => &t.function.parameters,
        }
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        self.schema().properties.keys().map(String::as_str).collect()
    }

    /// Required parameter names in declaration order.
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.schema().required.iter().map(String::as_str).collect()
    }

    /// Allowed values of a parameter, if restricted.
    #[must_use]
    pub fn enum_values(&self, param: &str) -> Option<&[JsonValue]> {
        self.schema()
            .properties
            .get(param)?
            .get("enum")?
            .as_array()
            .map(Vec::as_slice)
    }

    /// Rebuild a provider-neutral definition from this spec.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        let schema = self.schema();
        let parameters: IndexMap<String, ParameterSpec> = schema
            .properties
            .iter()
            .map(|(name, prop)| {
                (
                    name.clone(),
                    ParameterSpec::from_property_schema(prop, schema.is_required(name)),
                )
            })
            .collect();

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters,
            degradations: Vec::new(),
        }
    }
}

/// Render a definition in a provider's tool format.
pub fn to_provider_format(
    definition: &ToolDefinition,
    kind: ProviderKind,
) -> Result<ProviderToolSpec, ExportError> {
    let name = definition.name.clone();
    let description = definition.description.clone();
    let schema = definition.to_json_schema();

    let spec = match kind {
        ProviderKind::Claude => ProviderToolSpec::Claude(ClaudeTool {
            name,
            description,
            input_schema: schema,
        }),
        ProviderKind::Bedrock => ProviderToolSpec::Bedrock(BedrockTool {
            tool_spec: BedrockToolSpec {
                name,
                description,
                input_schema: BedrockInputSchema { json: schema },
            },
        }),
        ProviderKind::OpenAi => ProviderToolSpec::OpenAi(OpenAiTool {
            tool_type: "function".to_string(),
            function: OpenAiFunction {
                name,
                description,
                parameters: schema,
            },
        }),
    };
    Ok(spec)
}

/// Render a definition for a provider given by name.
///
/// Fails with [`ExportError::UnsupportedFormat`] for unknown names.
pub fn to_provider_format_named(
    definition: &ToolDefinition,
    provider: &str,
) -> Result<ProviderToolSpec, ExportError> {
    let kind: ProviderKind = provider.parse()?;
    to_provider_format(definition, kind)
}
