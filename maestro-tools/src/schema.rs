//! Schema derivation from parameter descriptors.
//!
//! [`SchemaDeriver`] turns anything implementing [`ParameterSource`] into a
//! [`ToolDefinition`]. Runtime-described callables use [`FunctionSignature`];
//! the `#[tool]` attribute generates a compile-time source.
//!
//! # Example
//!
//! ```rust
//! use maestro_tools::{DeriveOptions, FunctionSignature, SchemaDeriver};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), maestro_tools::SchemaError> {
//! let signature = FunctionSignature::new("get_weather")
//!     .with_docs("Get the weather.\n\n# Arguments\n\n* `location` - City name")
//!     .param("location", "String")
//!     .param_with_default("units", "String", json!("metric"));
//!
//! let options = DeriveOptions::new().with_enum("units", vec![json!("metric"), json!("imperial")]);
//! let def = SchemaDeriver::derive(&signature, &options)?;
//!
//! assert_eq!(def.required_parameters(), vec!["location"]);
//! # Ok(())
//! # }
//! ```

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use crate::definition::{validate_tool_name, ParamType, ParameterSpec, ToolDefinition};
use crate::docs::parse_docs;
use crate::errors::SchemaError;

/// Type information attached to a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    /// An explicit JSON type.
    Declared(ParamType),
    /// A language type name such as `Option<u32>` or `Vec<String>`.
    Named(String),
}

/// One parameter of a callable, as reported by a [`ParameterSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name.
    pub name: String,
    /// Zero-based position in the signature.
    pub position: usize,
    /// Type information, if any.
    pub type_hint: Option<TypeHint>,
    /// Default value, if any.
    pub default: Option<JsonValue>,
}

impl ParameterDescriptor {
    /// Create an untyped descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
            type_hint: None,
            default: None,
        }
    }

    /// Attach an explicit JSON type.
    #[must_use]
    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.type_hint = Some(TypeHint::Declared(param_type));
        self
    }

    /// Attach a language type name.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_hint = Some(TypeHint::Named(type_name.into()));
        self
    }

    /// Attach a default value.
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Anything that can describe a callable's name, docs and parameters.
pub trait ParameterSource: Send + Sync {
    /// Tool name.
    fn tool_name(&self) -> &str;

    /// Documentation text attached to the callable.
    fn documentation(&self) -> Option<&str> {
        None
    }

    /// Parameters in any order; they are sorted by position.
    fn parameters(&self) -> Vec<ParameterDescriptor>;
}

/// A callable signature described at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionSignature {
    name: String,
    docs: Option<String>,
    params: Vec<ParameterDescriptor>,
}

impl FunctionSignature {
    /// Create a signature with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            params: Vec::new(),
        }
    }

    /// Attach documentation text.
    #[must_use]
    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// Add a parameter with a language type name.
    #[must_use]
    pub fn param(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let position = self.params.len();
        self.with_parameter(ParameterDescriptor::new(name, position).with_type_name(type_name))
    }

    /// Add a parameter with a language type name and a default.
    #[must_use]
    pub fn param_with_default(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        default: JsonValue,
    ) -> Self {
        let position = self.params.len();
        self.with_parameter(
            ParameterDescriptor::new(name, position)
                .with_type_name(type_name)
                .with_default(default),
        )
    }

    /// Add a parameter with an explicit JSON type.
    #[must_use]
    pub fn typed_param(self, name: impl Into<String>, param_type: ParamType) -> Self {
        let position = self.params.len();
        self.with_parameter(ParameterDescriptor::new(name, position).with_type(param_type))
    }

    /// Add a parameter with no type information.
    #[must_use]
    pub fn untyped_param(self, name: impl Into<String>) -> Self {
        let position = self.params.len();
        self.with_parameter(ParameterDescriptor::new(name, position))
    }

    /// Add a fully specified descriptor.
    #[must_use]
    pub fn with_parameter(mut self, descriptor: ParameterDescriptor) -> Self {
        self.params.push(descriptor);
        self
    }
}

impl ParameterSource for FunctionSignature {
    fn tool_name(&self) -> &str {
        &self.name
    }

    fn documentation(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        self.params.clone()
    }
}

/// Caller-supplied data that wins over inferred data for one parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyOverride {
    /// Description to use instead of the documented one.
    pub description: Option<String>,
    /// Type to use instead of the inferred one.
    pub param_type: Option<ParamType>,
}

impl PropertyOverride {
    /// Override only the description.
    #[must_use]
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            param_type: None,
        }
    }

    /// Override only the type.
    #[must_use]
    pub fn param_type(param_type: ParamType) -> Self {
        Self {
            description: None,
            param_type: Some(param_type),
        }
    }
}

/// Options for [`SchemaDeriver::derive`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeriveOptions {
    /// Tool description to use instead of the documented one.
    pub description: Option<String>,
    /// Per-parameter overrides.
    pub properties: IndexMap<String, PropertyOverride>,
    /// Per-parameter allowed values.
    pub enum_values: IndexMap<String, Vec<JsonValue>>,
}

impl DeriveOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tool description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override a parameter.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: PropertyOverride) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Restrict a parameter to a fixed set of values.
    #[must_use]
    pub fn with_enum(mut self, name: impl Into<String>, values: Vec<JsonValue>) -> Self {
        self.enum_values.insert(name.into(), values);
        self
    }
}

/// Result of inferring a JSON type from a language type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredType {
    /// The JSON type, or `None` when the name is not recognised.
    pub param_type: Option<ParamType>,
    /// Whether the type was wrapped in `Option`.
    pub optional: bool,
}

/// Infer a JSON type from a language type name.
///
/// # Example
///
/// ```rust
/// use maestro_tools::{schema::infer_type, ParamType};
///
/// let inferred = infer_type("Option<Vec<String>>");
/// assert_eq!(inferred.param_type, Some(ParamType::Array));
/// assert!(inferred.optional);
/// ```
#[must_use]
pub fn infer_type(type_name: &str) -> InferredType {
    infer_inner(type_name, false)
}

fn infer_inner(ty: &str, optional: bool) -> InferredType {
    let ty = strip_reference(ty.trim());

    if ty.starts_with('[') {
        return InferredType {
            param_type: Some(ParamType::Array),
            optional,
        };
    }
    if ty.starts_with('(') {
        let unit = ty.chars().filter(|c| !c.is_whitespace()).eq("()".chars());
        return InferredType {
            param_type: (!unit).then_some(ParamType::Array),
            optional,
        };
    }

    let (outer, generic) = match ty.find('<') {
        Some(idx) if ty.ends_with('>') => (&ty[..idx], Some(&ty[idx + 1..ty.len() - 1])),
        _ => (ty, None),
    };
    let base = outer.rsplit("::").next().unwrap_or(outer).trim();

    match (base, generic) {
        ("Option", Some(inner)) => return infer_inner(inner, true),
        ("Box" | "Arc" | "Rc", Some(inner)) => return infer_inner(inner, optional),
        _ => {}
    }

    let param_type = match base {
        "String" | "str" | "char" | "Cow" | "PathBuf" | "Path" => Some(ParamType::String),
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" | "int" => Some(ParamType::Integer),
        "f32" | "f64" | "float" => Some(ParamType::Number),
        "bool" => Some(ParamType::Boolean),
        "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet" | "list" | "List" | "tuple" => {
            Some(ParamType::Array)
        }
        "HashMap" | "BTreeMap" | "IndexMap" | "Map" | "dict" | "Dict" => Some(ParamType::Object),
        "Value" | "JsonValue" | "Any" => Some(ParamType::Any),
        _ => None,
    };

    InferredType {
        param_type,
        optional,
    }
}

/// Strip `&`, `&'a` and `&mut` prefixes.
fn strip_reference(mut ty: &str) -> &str {
    while let Some(rest) = ty.strip_prefix('&') {
        ty = rest.trim_start();
        if let Some(after) = ty.strip_prefix('\'') {
            let end = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            ty = after[end..].trim_start();
        }
        if let Some(after) = ty
            .strip_prefix("mut")
            .filter(|r| r.starts_with(char::is_whitespace))
        {
            ty = after.trim_start();
        }
    }
    ty
}

/// Derives [`ToolDefinition`]s from parameter sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDeriver;

impl SchemaDeriver {
    /// Derive a tool definition.
    pub fn derive(
        source: &dyn ParameterSource,
        options: &DeriveOptions,
    ) -> Result<ToolDefinition, SchemaError> {
        let name = source.tool_name();
        validate_tool_name(name)?;

        let docs = parse_docs(source.documentation().unwrap_or_default());

        let mut descriptors = source.parameters();
        descriptors.sort_by_key(|d| d.position);

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(SchemaError::DuplicateParameter(descriptor.name.clone()));
            }
        }
        if let Some(unknown) = options.properties.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(SchemaError::UnknownOverride(unknown.clone()));
        }
        if let Some(unknown) = options.enum_values.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(SchemaError::UnknownEnumParameter(unknown.clone()));
        }

        let mut definition = ToolDefinition::new(
            name,
            options
                .description
                .clone()
                .unwrap_or_else(|| docs.description.clone()),
        );

        for descriptor in descriptors {
            let pname = descriptor.name;
            let property = options.properties.get(&pname);

            let (inferred, optional, unrecognised) = match &descriptor.type_hint {
                Some(TypeHint::Declared(t)) => (Some(*t), false, None),
                Some(TypeHint::Named(type_name)) => {
                    let inferred = infer_type(type_name);
                    (inferred.param_type, inferred.optional, Some(type_name.as_str()))
                }
                None => (None, false, None),
            };

            let param_type = match (property.and_then(|p| p.param_type), inferred) {
                (Some(explicit), _) => explicit,
                (None, Some(t)) => t,
                (None, None) => {
                    let note = match unrecognised {
                        Some(type_name) => format!(
                            "parameter '{pname}': unrecognised type '{type_name}', accepting any JSON value"
                        ),
                        None => format!(
                            "parameter '{pname}': no type information, accepting any JSON value"
                        ),
                    };
                    definition.degradations.push(note);
                    ParamType::Any
                }
            };

            let description = property
                .and_then(|p| p.description.clone())
                .unwrap_or_else(|| docs.param(&pname).to_string());

            let mut spec = ParameterSpec::new(param_type).with_description(description);
            match descriptor.default {
                Some(default) => spec = spec.with_default(default),
                None if optional => spec = spec.with_default(JsonValue::Null),
                None => {}
            }

            if let Some(values) = options.enum_values.get(&pname) {
                spec = spec.with_enum(values.clone());
            }

            definition.parameters.insert(pname, spec);
        }
        definition.validate()?;

        if !definition.degradations.is_empty() {
            tracing::debug!(
                tool_name = %definition.name,
                degradations = ?definition.degradations,
                "Schema derived with degradations"
            );
        }

        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn weather_signature() -> FunctionSignature {
        FunctionSignature::new("get_weather")
            .with_docs(
                "Get the current weather for a location.\n\n\
                 # Arguments\n\n\
                 * `location` - City name\n\
                 * `units` - Unit system",
            )
            .param("location", "&str")
            .param_with_default("units", "String", json!("metric"))
    }

    #[test]
    fn test_get_weather_derivation() {
        let options = DeriveOptions::new()
            .with_enum("units", vec![json!("metric"), json!("imperial")]);
        let def = SchemaDeriver::derive(&weather_signature(), &options).unwrap();

        assert_eq!(def.name, "get_weather");
        assert_eq!(def.description, "Get the current weather for a location.");
        assert_eq!(def.required_parameters(), vec!["location"]);

        let location = def.parameter("location").unwrap();
        assert_eq!(location.param_type, ParamType::String);
        assert_eq!(location.description, "City name");

        let units = def.parameter("units").unwrap();
        assert!(!units.required);
        assert_eq!(units.default, Some(json!("metric")));
        assert_eq!(units.enum_values, Some(vec![json!("metric"), json!("imperial")]));
        assert!(def.degradations.is_empty());
    }

    #[rstest]
    #[case("String", Some(ParamType::String), false)]
    #[case("&'a str", Some(ParamType::String), false)]
    #[case("&mut String", Some(ParamType::String), false)]
    #[case("u64", Some(ParamType::Integer), false)]
    #[case("f32", Some(ParamType::Number), false)]
    #[case("bool", Some(ParamType::Boolean), false)]
    #[case("Vec<String>", Some(ParamType::Array), false)]
    #[case("&[u8]", Some(ParamType::Array), false)]
    #[case("std::collections::HashMap<String, i32>", Some(ParamType::Object), false)]
    #[case("Option<u32>", Some(ParamType::Integer), true)]
    #[case("Option<Box<Vec<i32>>>", Some(ParamType::Array), true)]
    #[case("serde_json::Value", Some(ParamType::Any), false)]
    #[case("MyStruct", None, false)]
    fn test_infer_type(
        #[case] name: &str,
        #[case] expected: Option<ParamType>,
        #[case] optional: bool,
    ) {
        let inferred = infer_type(name);
        assert_eq!(inferred.param_type, expected);
        assert_eq!(inferred.optional, optional);
    }

    #[test]
    fn test_option_becomes_optional_with_null_default() {
        let sig = FunctionSignature::new("search").param("limit", "Option<u32>");
        let def = SchemaDeriver::derive(&sig, &DeriveOptions::new()).unwrap();
        let limit = def.parameter("limit").unwrap();
        assert_eq!(limit.param_type, ParamType::Integer);
        assert!(!limit.required);
        assert_eq!(limit.default, Some(JsonValue::Null));
    }

    #[test]
    fn test_untyped_and_unknown_degrade_to_any() {
        let sig = FunctionSignature::new("f")
            .untyped_param("a")
            .param("b", "Widget");
        let def = SchemaDeriver::derive(&sig, &DeriveOptions::new()).unwrap();

        assert_eq!(def.parameter("a").unwrap().param_type, ParamType::Any);
        assert_eq!(def.parameter("b").unwrap().param_type, ParamType::Any);
        assert_eq!(def.degradations.len(), 2);
        assert!(def.degradations[1].contains("Widget"));
    }

    #[test]
    fn test_overrides_win() {
        let options = DeriveOptions::new()
            .with_description("Weather lookup")
            .with_property("location", PropertyOverride::description("Where"))
            .with_property("units", PropertyOverride::param_type(ParamType::Any));
        let def = SchemaDeriver::derive(&weather_signature(), &options).unwrap();

        assert_eq!(def.description, "Weather lookup");
        assert_eq!(def.parameter("location").unwrap().description, "Where");
        assert_eq!(def.parameter("units").unwrap().param_type, ParamType::Any);
        assert_eq!(def.parameter("units").unwrap().description, "Unit system");
    }

    #[test]
    fn test_override_suppresses_degradation() {
        let sig = FunctionSignature::new("f").untyped_param("x");
        let options =
            DeriveOptions::new().with_property("x", PropertyOverride::param_type(ParamType::Integer));
        let def = SchemaDeriver::derive(&sig, &options).unwrap();
        assert!(def.degradations.is_empty());
    }

    #[test]
    fn test_no_docs_gives_empty_descriptions() {
        let sig = FunctionSignature::new("f").param("x", "i32");
        let def = SchemaDeriver::derive(&sig, &DeriveOptions::new()).unwrap();
        assert_eq!(def.description, "");
        assert_eq!(def.parameter("x").unwrap().description, "");
    }

    #[test]
    fn test_parameters_ordered_by_position() {
        let sig = FunctionSignature::new("f")
            .with_parameter(ParameterDescriptor::new("second", 1).with_type(ParamType::String))
            .with_parameter(ParameterDescriptor::new("first", 0).with_type(ParamType::String));
        let def = SchemaDeriver::derive(&sig, &DeriveOptions::new()).unwrap();
        let names: Vec<_> = def.parameters.keys().cloned().collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[rstest]
    #[case(
        FunctionSignature::new("f").param("x", "i32").param("x", "i32"),
        DeriveOptions::new(),
        SchemaError::DuplicateParameter("x".into())
    )]
    #[case(
        FunctionSignature::new("f").param("x", "i32"),
        DeriveOptions::new().with_enum("y", vec![json!(1)]),
        SchemaError::UnknownEnumParameter("y".into())
    )]
    #[case(
        FunctionSignature::new("f").param("x", "i32"),
        DeriveOptions::new().with_property("y", PropertyOverride::description("d")),
        SchemaError::UnknownOverride("y".into())
    )]
    #[case(
        FunctionSignature::new("f").param("x", "i32"),
        DeriveOptions::new().with_enum("x", vec![]),
        SchemaError::EmptyEnum("x".into())
    )]
    #[case(
        FunctionSignature::new("f").param_with_default("x", "i32", json!(9)),
        DeriveOptions::new().with_enum("x", vec![json!(1), json!(2)]),
        SchemaError::DefaultNotInEnum("x".into())
    )]
    #[case(
        FunctionSignature::new("f").param_with_default("x", "i32", json!("nine")),
        DeriveOptions::new(),
        SchemaError::DefaultTypeMismatch("x".into())
    )]
    #[case(
        FunctionSignature::new("f").param("x", "String"),
        DeriveOptions::new().with_enum("x", vec![json!("a"), json!(2)]),
        SchemaError::EnumTypeMismatch { parameter: "x".into(), value: "2".into() }
    )]
    #[case(
        FunctionSignature::new("bad name"),
        DeriveOptions::new(),
        SchemaError::InvalidName("bad name".into())
    )]
    fn test_derive_errors(
        #[case] sig: FunctionSignature,
        #[case] options: DeriveOptions,
        #[case] expected: SchemaError,
    ) {
        assert_eq!(SchemaDeriver::derive(&sig, &options), Err(expected));
    }
}
