//! Mock providers and classifiers for testing.
//!
//! - [`MockProvider`]: returns pre-configured replies in order
//! - [`FunctionProvider`]: computes each reply from the conversation
//! - [`FixedClassifier`]: always returns the same classification
//!
//! # Example
//!
//! ```rust
//! use maestro_agent::MockProvider;
//! use maestro_core::ProviderKind;
//! use serde_json::json;
//!
//! let provider = MockProvider::new(ProviderKind::Claude)
//!     .with_tool_call("get_weather", json!({"location": "Paris"}))
//!     .with_text_response("It is sunny in Paris.");
//! assert_eq!(provider.pending(), 2);
//! ```

use async_trait::async_trait;
use maestro_core::{
    generate_tool_call_id, ContentBlock, ConversationMessage, ProviderKind, Role,
};
use maestro_tools::ProviderToolSpec;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::classifier::{AgentProfile, Classifier, ClassifierResult};
use crate::errors::{ClassifierError, ProviderError};
use crate::provider::ModelProvider;

/// One recorded `converse` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Conversation sent to the provider.
    pub messages: Vec<ConversationMessage>,
    /// Names of the tools declared with it.
    pub tool_names: Vec<String>,
}

/// A provider with a queue of pre-configured replies.
///
/// When the queue is empty it answers with the text `Mock response`.
#[derive(Debug, Clone)]
pub struct MockProvider {
    kind: ProviderKind,
    responses: Arc<Mutex<VecDeque<Result<ConversationMessage, String>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProvider {
    /// Create a mock speaking `kind`'s formats.
    #[must_use]
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply.
    #[must_use]
    pub fn with_response(self, response: ConversationMessage) -> Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queue a plain text reply.
    #[must_use]
    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        self.with_response(ConversationMessage::assistant(text))
    }

    /// Queue a reply requesting one tool call.
    #[must_use]
    pub fn with_tool_call(self, tool_name: impl Into<String>, arguments: JsonValue) -> Self {
        self.with_response(ConversationMessage::new(
            Role::Assistant,
            vec![ContentBlock::tool_use(
                generate_tool_call_id(),
                tool_name,
                arguments,
            )],
        ))
    }

    /// Queue a provider failure.
    #[must_use]
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().push_back(Err(message.into()));
        self
    }

    /// Replies still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }

    /// Every call received so far.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn converse(
        &self,
        messages: &[ConversationMessage],
        tools: &[ProviderToolSpec],
    ) -> Result<ConversationMessage, ProviderError> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
        });

        match self.responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ProviderError::Rejected(message)),
            None => Ok(ConversationMessage::assistant("Mock response")),
        }
    }
}

type ReplyFn =
    dyn Fn(&[ConversationMessage]) -> Result<ConversationMessage, ProviderError> + Send + Sync;

/// A provider whose replies are computed by a function.
pub struct FunctionProvider {
    kind: ProviderKind,
    function: Box<ReplyFn>,
}

impl FunctionProvider {
    /// Create a provider from a reply function.
    pub fn new<F>(kind: ProviderKind, function: F) -> Self
    where
        F: Fn(&[ConversationMessage]) -> Result<ConversationMessage, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind,
            function: Box::new(function),
        }
    }

    /// A provider that always asks for the same tool call.
    #[must_use]
    pub fn always_tool_call(kind: ProviderKind, tool_name: impl Into<String>, arguments: JsonValue) -> Self {
        let tool_name = tool_name.into();
        Self::new(kind, move |_| {
            Ok(ConversationMessage::new(
                Role::Assistant,
                vec![ContentBlock::tool_use(
                    generate_tool_call_id(),
                    tool_name.clone(),
                    arguments.clone(),
                )],
            ))
        })
    }

    /// A provider that echoes the text of the last message.
    #[must_use]
    pub fn echo(kind: ProviderKind) -> Self {
        Self::new(kind, |messages| {
            let text = messages.last().map(ConversationMessage::text).unwrap_or_default();
            Ok(ConversationMessage::assistant(text))
        })
    }
}

impl std::fmt::Debug for FunctionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionProvider")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelProvider for FunctionProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn converse(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ProviderToolSpec],
    ) -> Result<ConversationMessage, ProviderError> {
        (self.function)(messages)
    }
}

/// A classifier that always gives the same answer.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    result: Result<ClassifierResult, String>,
}

impl FixedClassifier {
    /// Always select `agent`.
    pub fn selecting(agent: impl Into<String>) -> Self {
        Self {
            result: Ok(ClassifierResult::selected(agent, 1.0)),
        }
    }

    /// Never select anything.
    #[must_use]
    pub fn none() -> Self {
        Self {
            result: Ok(ClassifierResult::none()),
        }
    }

    /// Always fail.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(
        &self,
        _input: &str,
        _history: &[ConversationMessage],
        _agents: &[AgentProfile],
    ) -> Result<ClassifierResult, ClassifierError> {
        self.result.clone().map_err(ClassifierError::Failed)
    }
}
