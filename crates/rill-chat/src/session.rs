//! Per-request assembly of a streamed answer into the message store

use crate::{
    error::{Error, Result},
    store::MessageStore,
};
use rill_client::split_answer;

/// Transient state for one in-flight answer.
///
/// Holds the text received so far and the position of the assistant message
/// it writes to. Every write replaces the message's whole text with the
/// buffer, so syncing the same state twice leaves the store unchanged.
#[derive(Debug, Default)]
pub struct StreamSession {
    buffer: String,
    position: Option<usize>,
    complete: bool,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Position of the assistant message, once created
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Whether the session was finished or abandoned
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Append a fragment to the buffer without touching the store
    pub fn push(&mut self, fragment: &str) {
        if self.complete {
            tracing::warn!("Dropping {} bytes pushed after completion", fragment.len());
            return;
        }
        self.buffer.push_str(fragment);
    }

    /// Write the buffer into the store, creating the message on first use
    pub fn sync(&mut self, store: &mut MessageStore) -> Result<usize> {
        if self.complete {
            return self.position.ok_or(Error::SessionClosed);
        }
        match self.position {
            Some(position) => {
                store.rewrite(position, &self.buffer)?;
                Ok(position)
            }
            None => {
                let position = store.begin_answer(self.buffer.as_str())?;
                tracing::debug!("Answer started at message {}", position);
                self.position = Some(position);
                Ok(position)
            }
        }
    }

    /// Append a fragment and write the result through
    pub fn apply(&mut self, store: &mut MessageStore, fragment: &str) -> Result<usize> {
        self.push(fragment);
        self.sync(store)
    }

    /// Split the buffer into answer and sources and finalize the message.
    ///
    /// Creates an empty answer when nothing was received. Calling it again
    /// returns the same position without splitting twice.
    pub fn finish(&mut self, store: &mut MessageStore) -> Result<usize> {
        if self.complete {
            return self.position.ok_or(Error::SessionClosed);
        }
        let position = self.sync(store)?;
        let split = split_answer(&self.buffer);
        tracing::debug!(
            "Answer finalized at message {} with {} sources",
            position,
            split.sources.len()
        );
        store.finalize(position, split)?;
        self.complete = true;
        Ok(position)
    }

    /// Stop the session, leaving the message as last written
    pub fn abandon(&mut self, store: &mut MessageStore) -> Result<Option<usize>> {
        if !self.complete {
            if let Some(position) = self.position {
                store.release(position)?;
            }
            self.complete = true;
        }
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fragment_creates_message() {
        let mut store = MessageStore::new();
        store.push_user("What is 2+2?");
        let mut session = StreamSession::new();

        let position = session.apply(&mut store, "The ").unwrap();
        assert_eq!(position, 1);
        assert_eq!(store.get(1).unwrap().text, "The ");
        assert_eq!(store.in_progress(), Some(1));
    }

    #[test]
    fn test_fragments_rewrite_full_buffer() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();

        session.apply(&mut store, "The ").unwrap();
        let position = session.apply(&mut store, "answer is ").unwrap();
        assert_eq!(store.get(position).unwrap().text, "The answer is ");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();
        session.apply(&mut store, "partial").unwrap();

        let before = store.messages().to_vec();
        session.sync(&mut store).unwrap();
        session.sync(&mut store).unwrap();
        assert_eq!(store.messages(), before.as_slice());
    }

    #[test]
    fn test_finish_splits_sources() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();
        for fragment in ["The ", "answer is ", "4.\n--- Sources ---\nmath:arith\n"] {
            session.apply(&mut store, fragment).unwrap();
        }

        let position = session.finish(&mut store).unwrap();
        let message = store.get(position).unwrap();
        assert_eq!(message.text, "The answer is 4.");
        assert_eq!(message.sources(), ["math:arith".to_string()]);
        assert!(session.is_complete());
        assert_eq!(store.in_progress(), None);
    }

    #[test]
    fn test_finish_twice_keeps_first_result() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();
        session.apply(&mut store, "  Hello there  ").unwrap();

        let first = session.finish(&mut store).unwrap();
        session.push("ignored");
        let second = session.finish(&mut store).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get(first).unwrap().text, "Hello there");
        assert_eq!(session.buffer(), "  Hello there  ");
    }

    #[test]
    fn test_empty_stream_finalizes_empty_answer() {
        let mut store = MessageStore::new();
        store.push_user("q");
        let mut session = StreamSession::new();

        let position = session.finish(&mut store).unwrap();
        let message = store.get(position).unwrap();
        assert_eq!(message.text, "");
        assert!(message.is_finalized());
        assert!(message.sources().is_empty());
    }

    #[test]
    fn test_abandon_keeps_partial_text() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();
        session.apply(&mut store, "The ans").unwrap();

        let position = session.abandon(&mut store).unwrap();
        assert_eq!(position, Some(0));
        let message = store.get(0).unwrap();
        assert_eq!(message.text, "The ans");
        assert!(!message.is_finalized());
        assert_eq!(store.in_progress(), None);

        // nothing else reaches the store afterwards
        session.push("wer");
        session.sync(&mut store).unwrap();
        assert_eq!(store.get(0).unwrap().text, "The ans");
    }

    #[test]
    fn test_abandon_before_first_fragment() {
        let mut store = MessageStore::new();
        let mut session = StreamSession::new();
        assert_eq!(session.abandon(&mut store).unwrap(), None);
        assert!(matches!(session.finish(&mut store), Err(Error::SessionClosed)));
        assert!(store.is_empty());
    }
}
