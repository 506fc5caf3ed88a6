//! # maestro-core
//!
//! Core types shared by the maestro crates.
//!
//! This crate provides:
//! - The canonical conversation message model ([`ConversationMessage`],
//!   [`ContentBlock`])
//! - The set of supported providers ([`ProviderKind`])
//! - Codecs between provider-native messages and the canonical form
//!   ([`wire`])
//!
//! ## Example
//!
//! ```rust
//! use maestro_core::{wire, ProviderKind};
//! use serde_json::json;
//!
//! let native = json!({
//!     "role": "assistant",
//!     "content": [
//!         {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"location": "Paris"}}
//!     ]
//! });
//!
//! let msg = wire::decode_message(ProviderKind::Claude, &native).unwrap();
//! assert!(msg.has_tool_use());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod identifier;
pub mod messages;
pub mod provider;
pub mod wire;

pub use errors::{UnsupportedFormatError, WireError};
pub use identifier::{generate_tool_call_id, generate_turn_id};
pub use messages::{ContentBlock, ConversationMessage, Role, ToolResultBlock, ToolUseBlock};
pub use provider::ProviderKind;
pub use wire::{decode_message, encode_message};
