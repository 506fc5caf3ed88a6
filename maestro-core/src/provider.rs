//! Supported provider kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnsupportedFormatError;

/// A model provider whose tool and message formats are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Claude,
    /// AWS Bedrock Converse API.
    Bedrock,
    /// OpenAI Chat Completions API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// All supported kinds, in a stable order.
    pub const ALL: [ProviderKind; 3] = [Self::Claude, Self::Bedrock, Self::OpenAi];

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Bedrock => "bedrock",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "bedrock" | "aws-bedrock" => Ok(Self::Bedrock),
            "openai" | "open_ai" | "open-ai" => Ok(Self::OpenAi),
            _ => Err(UnsupportedFormatError::new(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds_and_aliases() {
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("BEDROCK".parse::<ProviderKind>().unwrap(), ProviderKind::Bedrock);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.provider, "gemini");
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }
}
