//! ID generation utilities.

use uuid::Uuid;

/// Generate a unique tool call ID.
///
/// Used when a provider response omits the id of a tool invocation.
///
/// # Example
///
/// ```rust
/// use maestro_core::identifier::generate_tool_call_id;
///
/// let id = generate_tool_call_id();
/// assert!(id.starts_with("call_"));
/// assert_eq!(id.len(), 37);
/// ```
#[must_use]
pub fn generate_tool_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// Generate a unique conversation-turn ID.
///
/// ```rust
/// use maestro_core::identifier::generate_turn_id;
///
/// assert!(generate_turn_id().starts_with("turn_"));
/// ```
#[must_use]
pub fn generate_turn_id() -> String {
    format!("turn_{}", Uuid::new_v4().simple())
}
