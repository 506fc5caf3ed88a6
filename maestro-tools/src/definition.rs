//! Tool definition types for describing tools to LLMs.
//!
//! A [`ToolDefinition`] is the provider-neutral description of a tool: its
//! name, its description, and an ordered map of [`ParameterSpec`]s. Provider
//! shapes are produced from it by [`crate::export`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::errors::SchemaError;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// JSON string.
    String,
    /// JSON integer.
    Integer,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Untyped; accepts any JSON value.
    Any,
}

impl ParamType {
    /// The JSON Schema `type` keyword, or `None` for [`ParamType::Any`].
    #[must_use]
    pub fn json_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }

    /// Parse a JSON Schema `type` keyword.
    #[must_use]
    pub fn from_json_type(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Whether `value` is an instance of this type.
    ///
    /// `null` is never accepted here; callers decide whether a null stands
    /// for an omitted optional argument.
    #[must_use]
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type().unwrap_or("any"))
    }
}

/// Description of one tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// JSON type.
    pub param_type: ParamType,
    /// Human-readable description (may be empty).
    #[serde(default)]
    pub description: String,
    /// Whether the model must supply this argument.
    pub required: bool,
    /// Value used when the argument is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Allowed values, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,
}

impl ParameterSpec {
    /// Create a required parameter of the given type.
    #[must_use]
    pub fn new(param_type: ParamType) -> Self {
        Self {
            param_type,
            description: String::new(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the parameter optional without a default.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set a default value. A parameter with a default is never required.
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }

    /// Restrict the parameter to a fixed set of values.
    #[must_use]
    pub fn with_enum(mut self, values: Vec<JsonValue>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Whether `value` is one of the allowed values (always true when unrestricted).
    #[must_use]
    pub fn allows(&self, value: &JsonValue) -> bool {
        self.enum_values
            .as_ref()
            .map_or(true, |values| values.contains(value))
    }

    /// Render this parameter as a JSON Schema property.
    #[must_use]
    pub fn to_property_schema(&self) -> JsonValue {
        let mut obj = serde_json::Map::new();

        if let Some(ty) = self.param_type.json_type() {
            obj.insert("type".into(), JsonValue::String(ty.to_string()));
        }
        obj.insert(
            "description".into(),
            JsonValue::String(self.description.clone()),
        );
        if let Some(values) = &self.enum_values {
            obj.insert("enum".into(), JsonValue::Array(values.clone()));
        }
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            obj.insert("default".into(), default.clone());
        }

        JsonValue::Object(obj)
    }

    /// Parse a JSON Schema property back into a spec.
    ///
    /// Unknown or missing `type` keywords yield [`ParamType::Any`].
    #[must_use]
    pub fn from_property_schema(schema: &JsonValue, required: bool) -> Self {
        let param_type = schema
            .get("type")
            .and_then(JsonValue::as_str)
            .and_then(ParamType::from_json_type)
            .unwrap_or(ParamType::Any);
        Self {
            param_type,
            description: schema
                .get("description")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            required,
            default: schema.get("default").cloned(),
            enum_values: schema
                .get("enum")
                .and_then(JsonValue::as_array)
                .cloned(),
        }
    }
}

/// JSON Schema for an object type (tool parameters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectJsonSchema {
    /// The schema type (always "object" for tool parameters).
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Property definitions.
    #[serde(default)]
    pub properties: IndexMap<String, JsonValue>,

    /// List of required property names.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
}

impl ObjectJsonSchema {
    /// Create a new empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a property without consuming self.
    pub fn add_property(&mut self, name: &str, schema: JsonValue, required: bool) {
        self.properties.insert(name.to_string(), schema);
        if required && !self.is_required(name) {
            self.required.push(name.to_string());
        }
    }

    /// Check if a property is required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Default for ObjectJsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a tool name against the rules all supported providers share.
pub fn validate_tool_name(name: &str) -> Result<(), SchemaError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

/// Complete, provider-neutral tool definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,

    /// Human-readable description of what the tool does.
    #[serde(default)]
    pub description: String,

    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterSpec>,

    /// Non-fatal notes recorded while deriving the schema, such as
    /// parameters whose type could not be inferred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<String>,
}

impl ToolDefinition {
    /// Create a new tool definition with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: IndexMap::new(),
            degradations: Vec::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Get the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    /// Names of required parameters, in declaration order.
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Mapping of constrained parameter names to their allowed values.
    #[must_use]
    pub fn enum_constraints(&self) -> IndexMap<&str, &[JsonValue]> {
        self.parameters
            .iter()
            .filter_map(|(name, spec)| {
                spec.enum_values
                    .as_deref()
                    .map(|values| (name.as_str(), values))
            })
            .collect()
    }

    /// Check the definition's invariants.
    ///
    /// A non-null default and every allowed value must be instances of the
    /// parameter's type, and a restricted default must be an allowed value.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_tool_name(&self.name)?;
        for (name, spec) in &self.parameters {
            let default = spec.default.as_ref().filter(|d| !d.is_null());
            if let Some(default) = default {
                if !spec.param_type.accepts(default) {
                    return Err(SchemaError::DefaultTypeMismatch(name.clone()));
                }
            }
            if let Some(values) = &spec.enum_values {
                if values.is_empty() {
                    return Err(SchemaError::EmptyEnum(name.clone()));
                }
                if let Some(value) = values.iter().find(|v| !spec.param_type.accepts(v)) {
                    return Err(SchemaError::EnumTypeMismatch {
                        parameter: name.clone(),
                        value: value.to_string(),
                    });
                }
                if let Some(default) = default {
                    if !values.contains(default) {
                        return Err(SchemaError::DefaultNotInEnum(name.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Build the parameter object schema.
    #[must_use]
    pub fn to_json_schema(&self) -> ObjectJsonSchema {
        let mut schema = ObjectJsonSchema::new();
        for (name, spec) in &self.parameters {
            schema.add_property(name, spec.to_property_schema(), spec.required);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn weather() -> ToolDefinition {
        ToolDefinition::new("get_weather", "Get the current weather")
            .with_parameter(
                "location",
                ParameterSpec::new(ParamType::String).with_description("City name"),
            )
            .with_parameter(
                "units",
                ParameterSpec::new(ParamType::String)
                    .with_default(json!("metric"))
                    .with_enum(vec![json!("metric"), json!("imperial")]),
            )
    }

    #[test]
    fn test_required_parameters_in_order() {
        let def = weather()
            .with_parameter("days", ParameterSpec::new(ParamType::Integer));
        assert_eq!(def.required_parameters(), vec!["location", "days"]);
    }

    #[test]
    fn test_enum_constraints() {
        let def = weather();
        let constraints = def.enum_constraints();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints["units"], &[json!("metric"), json!("imperial")][..]);
    }

    #[test]
    fn test_to_json_schema() {
        let schema = weather().to_json_schema().to_json().unwrap();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "City name"},
                    "units": {
                        "type": "string",
                        "description": "",
                        "enum": ["metric", "imperial"],
                        "default": "metric"
                    }
                },
                "required": ["location"]
            })
        );
    }

    #[test]
    fn test_any_omits_type() {
        let prop = ParameterSpec::new(ParamType::Any).to_property_schema();
        assert!(prop.get("type").is_none());
        assert!(ParamType::Any.accepts(&json!({"anything": [1, 2]})));
    }

    #[test]
    fn test_empty_required_omitted() {
        let def = ToolDefinition::new("ping", "")
            .with_parameter("n", ParameterSpec::new(ParamType::Integer).optional());
        let schema = def.to_json_schema().to_json().unwrap();
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(ParamType::Number.accepts(&json!(3)));
        assert!(!ParamType::String.accepts(&JsonValue::Null));
    }

    #[test]
    fn test_property_schema_round_trip() {
        let spec = ParameterSpec::new(ParamType::String)
            .with_description("Unit")
            .with_default(json!("metric"))
            .with_enum(vec![json!("metric"), json!("imperial")]);
        let parsed = ParameterSpec::from_property_schema(&spec.to_property_schema(), false);
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_validate_tool_name() {
        assert!(validate_tool_name("get_weather-v2").is_ok());
        assert_eq!(
            validate_tool_name(""),
            Err(SchemaError::InvalidName(String::new()))
        );
        assert!(validate_tool_name("has space").is_err());
        assert!(validate_tool_name(&"a".repeat(65)).is_err());
    }

    #[rstest]
    #[case::default_outside_enum(
        ParameterSpec::new(ParamType::String)
            .with_default(json!("fast"))
            .with_enum(vec![json!("slow")]),
        SchemaError::DefaultNotInEnum("mode".into())
    )]
    #[case::default_wrong_type(
        ParameterSpec::new(ParamType::Integer).with_default(json!("abc")),
        SchemaError::DefaultTypeMismatch("mode".into())
    )]
    #[case::enum_value_wrong_type(
        ParameterSpec::new(ParamType::Integer).with_enum(vec![json!(1), json!("x")]),
        SchemaError::EnumTypeMismatch { parameter: "mode".into(), value: "\"x\"".into() }
    )]
    #[case::empty_enum(
        ParameterSpec::new(ParamType::String).with_enum(vec![]),
        SchemaError::EmptyEnum("mode".into())
    )]
    fn test_validate_rejects_inconsistent_parameter(
        #[case] spec: ParameterSpec,
        #[case] expected: SchemaError,
    ) {
        let def = ToolDefinition::new("t", "").with_parameter("mode", spec);
        assert_eq!(def.validate(), Err(expected));
    }

    #[test]
    fn test_validate_accepts_typed_default_and_null() {
        let def = ToolDefinition::new("t", "")
            .with_parameter(
                "days",
                ParameterSpec::new(ParamType::Integer)
                    .with_default(json!(3))
                    .with_enum(vec![json!(1), json!(3), json!(7)]),
            )
            .with_parameter(
                "units",
                ParameterSpec::new(ParamType::String).with_default(JsonValue::Null),
            );
        assert_eq!(def.validate(), Ok(()));
        assert_eq!(weather().validate(), Ok(()));
    }
}
