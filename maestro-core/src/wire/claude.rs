//! Anthropic Messages API content blocks.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::WireError;
use crate::messages::{ContentBlock, ConversationMessage, Role, ToolResultBlock, ToolUseBlock};

/// A Claude message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessage {
    /// Role.
    pub role: Role,
    /// Content blocks.
    pub content: ClaudeContent,
}

/// Message content: a bare string or a list of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaudeContent {
    /// Plain text shorthand.
    Text(String),
    /// Content blocks.
    Blocks(Vec<ClaudeBlock>),
}

/// A Claude content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeBlock {
    /// Text.
    Text {
        /// Text.
        text: String,
    },
    /// Tool use requested by the model.
    ToolUse {
        /// Tool use ID.
        id: String,
        /// Tool name.
        name: String,
        /// Input arguments.
        input: JsonValue,
    },
    /// Tool result sent back to the model.
    ToolResult {
        /// ID of the answered tool use.
        tool_use_id: String,
        /// Result text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Whether this is an error.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl From<&ContentBlock> for ClaudeBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Self::Text { text: text.clone() },
            ContentBlock::ToolUse(t) => Self::ToolUse {
                id: t.id.clone(),
                name: t.name.clone(),
                input: t.input.clone(),
            },
            ContentBlock::ToolResult(r) => Self::ToolResult {
                tool_use_id: r.tool_use_id.clone(),
                content: Some(r.content_text()),
                is_error: r.is_error,
            },
        }
    }
}

impl From<ClaudeBlock> for ContentBlock {
    fn from(block: ClaudeBlock) -> Self {
        match block {
            ClaudeBlock::Text { text } => Self::Text { text },
            ClaudeBlock::ToolUse { id, name, input } => {
                Self::ToolUse(ToolUseBlock { id, name, input })
            }
            ClaudeBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Self::ToolResult(ToolResultBlock {
                tool_use_id,
                content: content
                    .map(super::result_text_to_value)
                    .unwrap_or(JsonValue::Null),
                is_error,
            }),
        }
    }
}

pub(crate) fn decode(value: &JsonValue) -> Result<ConversationMessage, WireError> {
    let msg: ClaudeMessage = serde_json::from_value(value.clone())
        .map_err(|e| WireError::malformed("claude", e.to_string()))?;

    let content = match msg.content {
        ClaudeContent::Text(text) => vec![ContentBlock::Text { text }],
        ClaudeContent::Blocks(blocks) => blocks.into_iter().map(ContentBlock::from).collect(),
    };
    Ok(ConversationMessage::new(msg.role, content))
}

pub(crate) fn encode(message: &ConversationMessage) -> Result<JsonValue, WireError> {
    let msg = ClaudeMessage {
        role: message.role,
        content: ClaudeContent::Blocks(message.content.iter().map(ClaudeBlock::from).collect()),
    };
    Ok(serde_json::to_value(msg)?)
}
