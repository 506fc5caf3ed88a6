//! Canonical conversation messages.
//!
//! A [`ConversationMessage`] is a role tag plus an ordered sequence of
//! [`ContentBlock`]s. Provider-native shapes are converted to and from this
//! representation by the codecs in [`crate::wire`].

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller, including tool results fed back to the model.
    User,
    /// The model.
    Assistant,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    /// Provider-supplied correlation id.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Arguments as supplied by the model.
    pub input: JsonValue,
}

/// The outcome of a tool invocation, keyed by the originating tool-use id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// Id of the [`ToolUseBlock`] this result answers.
    pub tool_use_id: String,
    /// Success payload, or the serialized error detail when `is_error` is set.
    pub content: JsonValue,
    /// Whether `content` describes a failure.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResultBlock {
    /// Create a successful result block.
    #[must_use]
    pub fn success(tool_use_id: impl Into<String>, content: JsonValue) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: false,
        }
    }

    /// Create an error result block.
    #[must_use]
    pub fn error(tool_use_id: impl Into<String>, detail: JsonValue) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: detail,
            is_error: true,
        }
    }

    /// Render the content as text, the way most providers want it.
    #[must_use]
    pub fn content_text(&self) -> String {
        match &self.content {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool invocation request.
    ToolUse(ToolUseBlock),
    /// A tool invocation result.
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    /// Create a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool-use block.
    #[must_use]
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: JsonValue) -> Self {
        Self::ToolUse(ToolUseBlock {
            id: id.into(),
            name: name.into(),
            input,
        })
    }

    /// Get the text if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Get the tool-use request if this is one.
    #[must_use]
    pub fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            Self::ToolUse(block) => Some(block),
            _ => None,
        }
    }

    /// Get the tool result if this is one.
    #[must_use]
    pub fn as_tool_result(&self) -> Option<&ToolResultBlock> {
        match self {
            Self::ToolResult(block) => Some(block),
            _ => None,
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who produced the message.
    pub role: Role,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl ConversationMessage {
    /// Create a message from blocks.
    #[must_use]
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Create a user text message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant text message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Append a block.
    #[must_use]
    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    /// Concatenated text of all text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Iterate over tool-use requests in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.content.iter().filter_map(ContentBlock::as_tool_use)
    }

    /// Iterate over tool results in order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResultBlock> {
        self.content.iter().filter_map(ContentBlock::as_tool_result)
    }

    /// Whether the message requests at least one tool invocation.
    #[must_use]
    pub fn has_tool_use(&self) -> bool {
        self.tool_uses().next().is_some()
    }

    /// Whether the message has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
