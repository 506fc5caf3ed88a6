//! The model provider seam.
//!
//! maestro does not talk to any model API itself. A [`ModelProvider`] takes
//! the conversation so far plus the tool declarations in its own format and
//! returns the model's next message.

use async_trait::async_trait;
use maestro_core::{ConversationMessage, ProviderKind};
use maestro_tools::ProviderToolSpec;

use crate::errors::ProviderError;

/// A model endpoint that can use tools.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Which tool and message format this provider speaks.
    fn kind(&self) -> ProviderKind;

    /// Provider name, for logs.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Send the conversation and return the model's reply.
    async fn converse(
        &self,
        messages: &[ConversationMessage],
        tools: &[ProviderToolSpec],
    ) -> Result<ConversationMessage, ProviderError>;
}
