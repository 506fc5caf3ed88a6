//! AWS Bedrock Converse content blocks.
//!
//! Converse blocks are externally tagged: `{"text": ...}`, `{"toolUse": {...}}`,
//! `{"toolResult": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::WireError;
use crate::messages::{ContentBlock, ConversationMessage, Role, ToolResultBlock, ToolUseBlock};

/// A Converse message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockMessage {
    /// Role.
    pub role: Role,
    /// Content blocks.
    pub content: Vec<BedrockBlock>,
}

/// A Converse content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BedrockBlock {
    /// Text.
    Text(String),
    /// Tool use requested by the model.
    ToolUse(BedrockToolUse),
    /// Tool result sent back to the model.
    ToolResult(BedrockToolResult),
}

/// Tool use payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolUse {
    /// Tool use ID.
    pub tool_use_id: String,
    /// Tool name.
    pub name: String,
    /// Input arguments.
    pub input: JsonValue,
}

/// Tool result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolResult {
    /// ID of the answered tool use.
    pub tool_use_id: String,
    /// Result content.
    pub content: Vec<BedrockResultContent>,
    /// `success` or `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolResultStatus>,
}

/// Tool result content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BedrockResultContent {
    /// Text result.
    Text(String),
    /// Structured result.
    Json(JsonValue),
}

/// Tool result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    /// Success.
    Success,
    /// Error.
    Error,
}

impl From<&ToolResultBlock> for BedrockToolResult {
    fn from(result: &ToolResultBlock) -> Self {
        let content = match &result.content {
            JsonValue::String(s) => BedrockResultContent::Text(s.clone()),
            other => BedrockResultContent::Json(other.clone()),
        };
        Self {
            tool_use_id: result.tool_use_id.clone(),
            content: vec![content],
            status: Some(if result.is_error {
                ToolResultStatus::Error
            } else {
                ToolResultStatus::Success
            }),
        }
    }
}

impl From<BedrockToolResult> for ToolResultBlock {
    fn from(result: BedrockToolResult) -> Self {
        let mut items: Vec<JsonValue> = result
            .content
            .into_iter()
            .map(|c| match c {
                BedrockResultContent::Text(s) => JsonValue::String(s),
                BedrockResultContent::Json(v) => v,
            })
            .collect();
        let content = match items.len() {
            0 => JsonValue::Null,
            1 => items.remove(0),
            _ => JsonValue::Array(items),
        };
        Self {
            tool_use_id: result.tool_use_id,
            content,
            is_error: result.status == Some(ToolResultStatus::Error),
        }
    }
}

pub(crate) fn decode(value: &JsonValue) -> Result<ConversationMessage, WireError> {
    let msg: BedrockMessage = serde_json::from_value(value.clone())
        .map_err(|e| WireError::malformed("bedrock", e.to_string()))?;

    let content = msg
        .content
        .into_iter()
        .map(|block| match block {
            BedrockBlock::Text(text) => ContentBlock::Text { text },
            BedrockBlock::ToolUse(t) => ContentBlock::ToolUse(ToolUseBlock {
                id: t.tool_use_id,
                name: t.name,
                input: t.input,
            }),
            BedrockBlock::ToolResult(r) => ContentBlock::ToolResult(r.into()),
        })
        .collect();
    Ok(ConversationMessage::new(msg.role, content))
}

pub(crate) fn encode(message: &ConversationMessage) -> Result<JsonValue, WireError> {
    let content = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => BedrockBlock::Text(text.clone()),
            ContentBlock::ToolUse(t) => BedrockBlock::ToolUse(BedrockToolUse {
                tool_use_id: t.id.clone(),
                name: t.name.clone(),
                input: t.input.clone(),
            }),
            ContentBlock::ToolResult(r) => BedrockBlock::ToolResult(r.into()),
        })
        .collect();
    let msg = BedrockMessage {
        role: message.role,
        content,
    };
    Ok(serde_json::to_value(msg)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_converse_output() {
        let value = json!({
            "role": "assistant",
            "content": [
                {"text": "Looking it up."},
                {"toolUse": {"toolUseId": "tooluse_abc", "name": "get_weather", "input": {"location": "Lima"}}}
            ]
        });

        let msg = decode(&value).unwrap();
        let uses: Vec<_> = msg.tool_uses().collect();
        assert_eq!(uses[0].id, "tooluse_abc");
        assert_eq!(uses[0].name, "get_weather");
        assert_eq!(msg.text(), "Looking it up.");
    }

    #[test]
    fn test_encode_error_status() {
        let msg = ConversationMessage::new(
            Role::User,
            vec![ContentBlock::ToolResult(ToolResultBlock::error(
                "tooluse_abc",
                json!({"error_type": "not_found"}),
            ))],
        );

        let value = encode(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [{
                    "toolResult": {
                        "toolUseId": "tooluse_abc",
                        "content": [{"json": {"error_type": "not_found"}}],
                        "status": "error"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_decode_result_without_status_is_success() {
        let value = json!({
            "role": "user",
            "content": [{"toolResult": {"toolUseId": "t1", "content": [{"text": "ok"}]}}]
        });
        let msg = decode(&value).unwrap();
        let result = msg.tool_results().next().unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content, json!("ok"));
    }
}
