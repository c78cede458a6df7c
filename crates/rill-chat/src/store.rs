//! Ordered message storage with a single rewritable answer slot

use crate::error::{Error, Result};
use rill_client::{Author, Message, SplitAnswer};

/// Ordered conversation messages.
///
/// Append-only, except for the one assistant message that is still being
/// streamed. That message is addressed by the position it was given when it
/// was created; once finalized or released it can no longer be rewritten.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    in_progress: Option<usize>,
}

impl MessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Message at a position
    pub fn get(&self, position: usize) -> Option<&Message> {
        self.messages.get(position)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Position of the answer currently being streamed, if any
    pub fn in_progress(&self) -> Option<usize> {
        self.in_progress
    }

    /// The most recent finalized answer
    pub fn last_answer(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.author == Author::Assistant && m.is_finalized())
    }

    /// Append a user message, returning its position
    pub fn push_user(&mut self, text: impl Into<String>) -> usize {
        self.messages.push(Message::user(text));
        self.messages.len() - 1
    }

    /// Create the in-progress assistant message, returning its position
    pub fn begin_answer(&mut self, text: impl Into<String>) -> Result<usize> {
        if let Some(position) = self.in_progress {
            return Err(Error::AnswerInProgress(position));
        }
        self.messages.push(Message::assistant(text));
        let position = self.messages.len() - 1;
        self.in_progress = Some(position);
        Ok(position)
    }

    /// Replace the full text of the in-progress answer
    pub fn rewrite(&mut self, position: usize, text: &str) -> Result<()> {
        let message = self.in_progress_mut(position)?;
        if message.text != text {
            message.text.clear();
            message.text.push_str(text);
        }
        Ok(())
    }

    /// Set the final answer text and sources; the message is immutable after this
    pub fn finalize(&mut self, position: usize, split: SplitAnswer) -> Result<&Message> {
        let message = self.in_progress_mut(position)?;
        message.text = split.answer;
        message.sources = Some(split.sources);
        self.in_progress = None;
        Ok(&self.messages[position])
    }

    /// Stop treating the answer as in progress, keeping its text as it is
    pub fn release(&mut self, position: usize) -> Result<()> {
        self.in_progress_mut(position)?;
        self.in_progress = None;
        Ok(())
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
        self.in_progress = None;
    }

    fn in_progress_mut(&mut self, position: usize) -> Result<&mut Message> {
        if position >= self.messages.len() {
            return Err(Error::NoSuchMessage(position));
        }
        if self.in_progress != Some(position) {
            return Err(Error::NotInProgress(position));
        }
        Ok(&mut self.messages[position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(answer: &str, sources: &[&str]) -> SplitAnswer {
        SplitAnswer {
            answer: answer.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_positions_follow_insertion_order() {
        let mut store = MessageStore::new();
        assert_eq!(store.push_user("first"), 0);
        assert_eq!(store.begin_answer("").unwrap(), 1);
        assert_eq!(store.push_user("second"), 2);
        assert_eq!(store.in_progress(), Some(1));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_only_one_answer_in_progress() {
        let mut store = MessageStore::new();
        let position = store.begin_answer("a").unwrap();
        let err = store.begin_answer("b").unwrap_err();
        assert!(matches!(err, Error::AnswerInProgress(p) if p == position));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rewrite_replaces_full_text() {
        let mut store = MessageStore::new();
        store.push_user("q");
        let position = store.begin_answer("The ").unwrap();
        store.rewrite(position, "The answer").unwrap();
        assert_eq!(store.get(position).unwrap().text, "The answer");
        store.rewrite(position, "The answer").unwrap();
        assert_eq!(store.get(position).unwrap().text, "The answer");
    }

    #[test]
    fn test_rewrite_rejects_other_positions() {
        let mut store = MessageStore::new();
        let user = store.push_user("q");
        store.begin_answer("x").unwrap();

        assert!(matches!(store.rewrite(user, "y"), Err(Error::NotInProgress(0))));
        assert!(matches!(store.rewrite(9, "y"), Err(Error::NoSuchMessage(9))));
        assert_eq!(store.get(user).unwrap().text, "q");
    }

    #[test]
    fn test_finalize_makes_answer_immutable() {
        let mut store = MessageStore::new();
        let position = store.begin_answer("4.\n--- Sources ---\nmath:arith").unwrap();

        let message = store.finalize(position, split("4.", &["math:arith"])).unwrap();
        assert_eq!(message.text, "4.");
        assert_eq!(message.sources(), ["math:arith".to_string()]);
        assert_eq!(store.in_progress(), None);

        assert!(matches!(
            store.rewrite(position, "stale"),
            Err(Error::NotInProgress(_))
        ));
        assert!(store.finalize(position, split("again", &[])).is_err());
        assert_eq!(store.get(position).unwrap().text, "4.");
    }

    #[test]
    fn test_release_keeps_partial_text_without_sources() {
        let mut store = MessageStore::new();
        let position = store.begin_answer("The ans").unwrap();
        store.release(position).unwrap();

        let message = store.get(position).unwrap();
        assert_eq!(message.text, "The ans");
        assert!(message.sources.is_none());
        assert_eq!(store.in_progress(), None);
        assert!(store.rewrite(position, "more").is_err());

        // a new answer may start once the old one is released
        assert_eq!(store.begin_answer("").unwrap(), 1);
    }

    #[test]
    fn test_last_answer_skips_unfinalized() {
        let mut store = MessageStore::new();
        let first = store.begin_answer("one").unwrap();
        store.finalize(first, split("one", &["s"])).unwrap();
        let second = store.begin_answer("partial").unwrap();
        store.release(second).unwrap();

        assert_eq!(store.last_answer().unwrap().text, "one");
    }

    #[test]
    fn test_clear() {
        let mut store = MessageStore::new();
        store.push_user("q");
        store.begin_answer("a").unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.in_progress(), None);
    }
}
