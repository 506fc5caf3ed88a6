//! Argument validation against a tool definition.

use serde_json::Value as JsonValue;

use crate::definition::ToolDefinition;
use crate::errors::ToolError;
use crate::tool::ToolArgs;

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "number",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Validate model-supplied arguments and fill in defaults.
///
/// Rejects non-object arguments, unknown names, missing required names,
/// values of the wrong JSON type and values outside an enum constraint. An
/// explicit `null` for an optional parameter counts as omitted. Omitted
/// optional parameters that have a default are filled with it.
pub fn validate_arguments(
    definition: &ToolDefinition,
    arguments: JsonValue,
) -> Result<ToolArgs, ToolError> {
    let mut args = match arguments {
        JsonValue::Object(map) => map,
        other => {
            return Err(ToolError::invalid_args(format!(
                "arguments must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    if let Some(unknown) = args
        .keys()
        .find(|k| !definition.parameters.contains_key(k.as_str()))
    {
        return Err(ToolError::invalid_field(
            unknown.clone(),
            format!("unknown parameter '{unknown}'"),
        ));
    }

    for (name, spec) in &definition.parameters {
        let supplied = args
            .get(name)
            .filter(|v| !(v.is_null() && !spec.required));

        let Some(value) = supplied else {
            if spec.required {
                return Err(ToolError::invalid_field(
                    name.clone(),
                    format!("missing required parameter '{name}'"),
                ));
            }
            if let Some(default) = &spec.default {
                args.insert(name.clone(), default.clone());
            }
            continue;
        };

        if !spec.param_type.accepts(value) {
            return Err(ToolError::invalid_field(
                name.clone(),
                format!(
                    "parameter '{name}' expected {}, got {}",
                    spec.param_type,
                    json_kind(value)
                ),
            ));
        }
        if !spec.allows(value) {
            let allowed = spec
                .enum_values
                .as_ref()
                .map(|v| JsonValue::Array(v.clone()).to_string())
                .unwrap_or_default();
            return Err(ToolError::invalid_field(
                name.clone(),
                format!("parameter '{name}' must be one of {allowed}, got {value}"),
            ));
        }
    }

    Ok(args)
}
