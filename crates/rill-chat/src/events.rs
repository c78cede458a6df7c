//! Chat event types

use crate::chat::Phase;
use rill_client::Message;
use serde::{Deserialize, Serialize};

/// Events emitted while a question is answered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// The request state machine moved
    PhaseChanged { phase: Phase },

    /// The user's question was appended
    UserMessage { position: usize, message: Message },

    /// The first fragment arrived and the assistant message was created
    AnswerStarted { position: usize, message: Message },

    /// The in-progress answer now has this full text
    AnswerUpdated { position: usize, text: String },

    /// The answer was split and committed
    AnswerFinalized { position: usize, message: Message },

    /// The question was cancelled; a partial answer, if any, stays as written
    Cancelled { position: Option<usize> },

    /// The question failed
    Failed {
        position: Option<usize>,
        message: String,
    },

    /// All messages were removed
    Cleared,
}

impl ChatEvent {
    /// Check if this event ends a question
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::AnswerFinalized { .. } | ChatEvent::Cancelled { .. } | ChatEvent::Failed { .. }
        )
    }
}
