//! # maestro-macros
//!
//! Procedural macros for maestro.
//!
//! The [`macro@tool`] attribute turns a plain function into a tool. The
//! function's parameter names, parameter types and doc comment are captured
//! at compile time as a `ParameterSource`, and the schema is produced by the
//! same `SchemaDeriver` used for runtime-described callables.
//!
//! ```ignore
//! use maestro::tool;
//!
//! /// Get the current weather.
//! ///
//! /// # Arguments
//! ///
//! /// * `location` - City name
//! /// * `units` - Unit system
//! #[tool]
//! async fn get_weather(location: String, units: Option<String>) -> String {
//!     format!("Sunny in {location}")
//! }
//!
//! let tool = GetWeatherTool::new()?;
//! ```

extern crate proc_macro;

mod tool;
mod utils;

use proc_macro::TokenStream;

/// Attribute macro for creating tools from functions.
///
/// Keeps the function as written and generates, for `fn get_weather`:
///
/// - `GetWeatherParams`: a `ParameterSource` describing the parameters
/// - `GetWeatherTool`: a `Tool` whose `new()` / `with_options()` derive the
///   definition and whose `call` deserializes each argument, invokes the
///   function (awaiting it if async) and serializes the return value
///
/// A `Result` return is unwrapped; its error becomes a callable fault, or is
/// passed through unchanged when it already is a `ToolError`.
///
/// # Attributes
///
/// - `#[tool(name = "...")]` - Override the tool name (default: function name)
/// - `#[tool(description = "...")]` - Override the documented description
/// - `#[tool(defaults(units = "celsius", days = 3))]` - Default values; each
///   expression is converted with `serde_json::json!`
///
/// # Optional parameters
///
/// A parameter is optional when it has an entry in `defaults` or its type is
/// `Option<T>`. Without a `defaults` entry an `Option<T>` parameter gets a
/// `null` default. An omitted argument is replaced by its default before the
/// function is called.
///
/// # Example
///
/// ```ignore
/// #[tool(defaults(units = "celsius"))]
/// fn get_weather(location: String, units: String) -> String {
///     format!("21 {units} in {location}")
/// }
///
/// #[tool(name = "search", description = "Search the index")]
/// fn search_index(query: &str, limit: Option<u32>) -> Result<Vec<String>, anyhow::Error> {
///     Ok(vec![])
/// }
/// ```
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    tool::tool_attribute_impl(attr, item)
}
