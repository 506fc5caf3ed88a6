//! Provider-native message codecs.
//!
//! Each submodule holds the serde types for one provider's message shape and
//! converts them to and from [`ConversationMessage`]. Only content blocks are
//! covered (text, tool use and tool result); transport envelopes such as
//! request parameters or streaming events are not.
//!
//! # Tool result fidelity
//!
//! Bedrock carries tool results as JSON or text and round-trips them exactly.
//! Claude and OpenAI carry them as text: objects and arrays are serialized
//! and parsed back on decode, but numbers, booleans and `null` come back as
//! their JSON text. OpenAI also has no error flag. An error result is sent
//! as text prefixed with `Error: `, so a successful string result that
//! starts with that prefix decodes as an error.

pub mod bedrock;
pub mod claude;
pub mod openai;

use serde_json::Value as JsonValue;

use crate::errors::WireError;
use crate::messages::ConversationMessage;
use crate::provider::ProviderKind;

/// Decode a provider-native message into the canonical form.
///
/// For OpenAI, `value` may also be an array of messages (as produced by
/// [`encode_message`]); their blocks are merged into one message.
pub fn decode_message(
    kind: ProviderKind,
    value: &JsonValue,
) -> Result<ConversationMessage, WireError> {
    match kind {
        ProviderKind::Claude => claude::decode(value),
        ProviderKind::Bedrock => bedrock::decode(value),
        ProviderKind::OpenAi => openai::decode(value),
    }
}

/// Tool-result text as a JSON value: objects and arrays are parsed back,
/// anything else stays a string.
pub(crate) fn result_text_to_value(text: String) -> JsonValue {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<JsonValue>(&text) {
            return value;
        }
    }
    JsonValue::String(text)
}

/// Encode a canonical message in the provider's native shape.
///
/// Claude and Bedrock yield a single message object. OpenAI yields an array,
/// because every tool result travels as its own `role: "tool"` message.
pub fn encode_message(
    kind: ProviderKind,
    message: &ConversationMessage,
) -> Result<JsonValue, WireError> {
    match kind {
        ProviderKind::Claude => claude::encode(message),
        ProviderKind::Bedrock => bedrock::encode(message),
        ProviderKind::OpenAi => openai::encode(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ContentBlock, Role, ToolResultBlock};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ProviderKind::Claude)]
    #[case(ProviderKind::Bedrock)]
    #[case(ProviderKind::OpenAi)]
    fn test_tool_use_round_trip(#[case] kind: ProviderKind) {
        let msg = ConversationMessage::new(
            Role::Assistant,
            vec![
                ContentBlock::text("Let me check."),
                ContentBlock::tool_use("call_1", "get_weather", json!({"location": "Paris"})),
            ],
        );

        let encoded = encode_message(kind, &msg).unwrap();
        let decoded = decode_message(kind, &encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[rstest]
    #[case(ProviderKind::Claude)]
    #[case(ProviderKind::Bedrock)]
    #[case(ProviderKind::OpenAi)]
    fn test_tool_result_round_trip(#[case] kind: ProviderKind) {
        let msg = ConversationMessage::new(
            Role::User,
            vec![
                ContentBlock::ToolResult(ToolResultBlock::success("call_1", json!("sunny"))),
                ContentBlock::ToolResult(ToolResultBlock::success(
                    "call_2",
                    json!({"temp": 21, "tags": ["dry"]}),
                )),
                ContentBlock::ToolResult(ToolResultBlock::error(
                    "call_3",
                    json!({"error_type": "not_found", "message": "tool 'nope' not found"}),
                )),
            ],
        );

        let encoded = encode_message(kind, &msg).unwrap();
        let decoded = decode_message(kind, &encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[rstest]
    #[case(ProviderKind::Claude, json!("21"))]
    #[case(ProviderKind::Bedrock, json!(21))]
    #[case(ProviderKind::OpenAi, json!("21"))]
    fn test_scalar_result_fidelity(#[case] kind: ProviderKind, #[case] expected: JsonValue) {
        let msg = ConversationMessage::new(
            Role::User,
            vec![ContentBlock::ToolResult(ToolResultBlock::success("call_1", json!(21)))],
        );

        let decoded = decode_message(kind, &encode_message(kind, &msg).unwrap()).unwrap();
        let result = decoded.tool_results().next().unwrap();
        assert_eq!(result.content, expected);
        assert!(!result.is_error);
    }

    #[test]
    fn test_result_text_to_value() {
        assert_eq!(result_text_to_value("{\"a\":1}".into()), json!({"a": 1}));
        assert_eq!(result_text_to_value("[1, 2]".into()), json!([1, 2]));
        assert_eq!(result_text_to_value("{not json".into()), json!("{not json"));
        assert_eq!(result_text_to_value("42".into()), json!("42"));
    }
}
