//! OpenAI Chat Completions messages.
//!
//! Tool-call arguments travel as JSON-encoded strings. Tool results are
//! separate `role: "tool"` messages, so a canonical message with several
//! results encodes to several OpenAI messages.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::WireError;
use crate::messages::{ContentBlock, ConversationMessage, Role, ToolResultBlock, ToolUseBlock};

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum OpenAiMessage {
    /// User message.
    User {
        /// Text content.
        content: String,
    },
    /// Assistant message.
    Assistant {
        /// Text content, absent when the model only calls tools.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<OpenAiToolCall>,
    },
    /// Tool result message.
    Tool {
        /// ID of the answered tool call.
        tool_call_id: String,
        /// Result text.
        content: String,
    },
}

/// A tool call in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    /// Call ID.
    pub id: String,
    /// Always `function`.
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// Function call.
    pub function: OpenAiFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function name and JSON-string arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

/// Parse a JSON-string argument payload.
///
/// Unparseable text is kept as a JSON string so that argument validation
/// reports it instead of the decoder failing the whole message.
fn parse_arguments(raw: &str) -> JsonValue {
    if raw.trim().is_empty() {
        return JsonValue::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Tool results that carry an error are prefixed so the model can tell them
/// apart; the marker is stripped again on decode. The format has no error
/// flag, so a successful string result starting with the prefix decodes as
/// an error.
const ERROR_PREFIX: &str = "Error: ";

fn decode_one(msg: OpenAiMessage) -> (Role, Vec<ContentBlock>) {
    match msg {
        OpenAiMessage::User { content } => (Role::User, vec![ContentBlock::Text { text: content }]),
        OpenAiMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
            if let Some(text) = content.filter(|t| !t.is_empty()) {
                blocks.push(ContentBlock::Text { text });
            }
            blocks.extend(tool_calls.into_iter().map(|call| {
                ContentBlock::ToolUse(ToolUseBlock {
                    id: call.id,
                    name: call.function.name,
                    input: parse_arguments(&call.function.arguments),
                })
            }));
            (Role::Assistant, blocks)
        }
        OpenAiMessage::Tool {
            tool_call_id,
            content,
        } => {
            let block = match content.strip_prefix(ERROR_PREFIX) {
                Some(detail) => {
                    ToolResultBlock::error(tool_call_id, super::result_text_to_value(detail.into()))
                }
                None => ToolResultBlock::success(tool_call_id, super::result_text_to_value(content)),
            };
            (Role::User, vec![ContentBlock::ToolResult(block)])
        }
    }
}

fn parse_message(value: &JsonValue) -> Result<OpenAiMessage, WireError> {
    if let Some(role) = value.get("role").and_then(JsonValue::as_str) {
        if !matches!(role, "user" | "assistant" | "tool") {
            return Err(WireError::UnsupportedRole(role.to_string()));
        }
    }
    serde_json::from_value(value.clone()).map_err(|e| WireError::malformed("openai", e.to_string()))
}

pub(crate) fn decode(value: &JsonValue) -> Result<ConversationMessage, WireError> {
    let messages = match value {
        JsonValue::Array(items) => items.iter().map(parse_message).collect::<Result<Vec<_>, _>>()?,
        single => vec![parse_message(single)?],
    };

    let mut role = None;
    let mut content = Vec::new();
    for msg in messages {
        let (r, blocks) = decode_one(msg);
        match role {
            None => role = Some(r),
            Some(existing) if existing != r => {
                return Err(WireError::malformed(
                    "openai",
                    "message array mixes user and assistant content",
                ));
            }
            Some(_) => {}
        }
        content.extend(blocks);
    }

    let role = role.ok_or_else(|| WireError::malformed("openai", "empty message array"))?;
    Ok(ConversationMessage::new(role, content))
}

pub(crate) fn encode(message: &ConversationMessage) -> Result<JsonValue, WireError> {
    let mut out = Vec::new();
    match message.role {
        Role::Assistant => {
            let text = message.text();
            let tool_calls = message
                .tool_uses()
                .map(|t| {
                    Ok(OpenAiToolCall {
                        id: t.id.clone(),
                        call_type: function_type(),
                        function: OpenAiFunctionCall {
                            name: t.name.clone(),
                            arguments: serde_json::to_string(&t.input)?,
                        },
                    })
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?;
            out.push(OpenAiMessage::Assistant {
                content: (!text.is_empty()).then_some(text),
                tool_calls,
            });
        }
        Role::User => {
            let text = message.text();
            if !text.is_empty() {
                out.push(OpenAiMessage::User { content: text });
            }
            for result in message.tool_results() {
                let body = result.content_text();
                out.push(OpenAiMessage::Tool {
                    tool_call_id: result.tool_use_id.clone(),
                    content: if result.is_error {
                        format!("{ERROR_PREFIX}{body}")
                    } else {
                        body
                    },
                });
            }
        }
    }
    Ok(serde_json::to_value(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_string_arguments() {
        let value = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"location\":\"Rome\"}"}
            }]
        });

        let msg = decode(&value).unwrap();
        assert!(msg.text().is_empty());
        let call = msg.tool_uses().next().unwrap();
        assert_eq!(call.input, json!({"location": "Rome"}));
    }

    #[test]
    fn test_invalid_arguments_kept_as_string() {
        let value = json!({
            "role": "assistant",
            "tool_calls": [{"id": "c1", "function": {"name": "f", "arguments": "{not json"}}]
        });

        let msg = decode(&value).unwrap();
        assert_eq!(msg.tool_uses().next().unwrap().input, json!("{not json"));
    }

    #[test]
    fn test_encode_results_as_tool_messages() {
        let msg = ConversationMessage::new(
            Role::User,
            vec![
                ContentBlock::ToolResult(ToolResultBlock::success("c1", json!({"temp": 21}))),
                ContentBlock::ToolResult(ToolResultBlock::error("c2", json!("boom"))),
            ],
        );

        let value = encode(&msg).unwrap();
        assert_eq!(
            value,
            json!([
                {"role": "tool", "tool_call_id": "c1", "content": "{\"temp\":21}"},
                {"role": "tool", "tool_call_id": "c2", "content": "Error: boom"}
            ])
        );
    }

    #[test]
    fn test_error_prefix_marks_results_as_errors() {
        let value = json!([
            {"role": "tool", "tool_call_id": "c1", "content": "{\"temp\":21}"},
            {"role": "tool", "tool_call_id": "c2", "content": "Error: {\"error_type\":\"timeout\"}"},
            {"role": "tool", "tool_call_id": "c3", "content": "Error: disk full"}
        ]);

        let msg = decode(&value).unwrap();
        let results: Vec<_> = msg.tool_results().collect();
        assert_eq!(results[0].content, json!({"temp": 21}));
        assert!(!results[0].is_error);
        assert_eq!(results[1].content, json!({"error_type": "timeout"}));
        assert!(results[1].is_error);
        assert_eq!(results[2].content, json!("disk full"));
        assert!(results[2].is_error);
    }

    #[test]
    fn test_system_role_unsupported() {
        let err = decode(&json!({"role": "system", "content": "x"})).unwrap_err();
        assert!(matches!(err, WireError::UnsupportedRole(r) if r == "system"));
    }
}
