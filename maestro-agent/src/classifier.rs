//! The classifier seam.
//!
//! A [`Classifier`] picks which agent should handle an input. maestro ships
//! no classification algorithm; callers plug in their own.

use async_trait::async_trait;
use maestro_core::ConversationMessage;

use crate::errors::ClassifierError;

/// Name and description of an agent a classifier may choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    /// Agent name.
    pub name: String,
    /// What the agent is for.
    pub description: String,
}

/// Outcome of a classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierResult {
    /// Chosen agent, if any.
    pub selected_agent: Option<String>,
    /// Confidence in the choice, from 0 to 1.
    pub confidence: f64,
}

impl ClassifierResult {
    /// Select an agent.
    pub fn selected(agent: impl Into<String>, confidence: f64) -> Self {
        Self {
            selected_agent: Some(agent.into()),
            confidence,
        }
    }

    /// Select nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            selected_agent: None,
            confidence: 0.0,
        }
    }
}

/// Routes an input to one of the known agents.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Choose an agent for `input`.
    async fn classify(
        &self,
        input: &str,
        history: &[ConversationMessage],
        agents: &[AgentProfile],
    ) -> Result<ClassifierResult, ClassifierError>;
}
