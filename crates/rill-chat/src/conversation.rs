//! Conversation state: messages, busy flag, and the last error.

use crate::store::MessageStore;
use rill_client::Message;

/// Conversation state as the UI layer sees it.
///
/// Only [`Chat`](crate::Chat) mutates it; readers get the message list, the
/// busy flag and the current error string.
#[derive(Debug, Default)]
pub struct Conversation {
    pub(crate) store: MessageStore,
    pub(crate) busy: bool,
    pub(crate) error: Option<String>,
}

impl Conversation {
    /// Messages in insertion order
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// The underlying message store
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Whether a question is being answered
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Error from the last failed question, cleared by the next submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The most recent finalized answer
    pub fn last_answer(&self) -> Option<&Message> {
        self.store.last_answer()
    }
}
