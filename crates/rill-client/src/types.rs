//! Core types for question/answer conversations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    /// Get a human-readable name for this author
    pub fn name(&self) -> &'static str {
        match self {
            Author::User => "You",
            Author::Assistant => "Assistant",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote it
    pub author: Author,
    /// Message text; grows while an answer streams in
    pub text: String,
    /// Captured when the message was first created
    pub timestamp: DateTime<Utc>,
    /// Source citations, only set once an assistant answer is finalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl Message {
    /// Create a user message stamped with the current time
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
            timestamp: Utc::now(),
            sources: None,
        }
    }

    /// Create an assistant message stamped with the current time
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            sources: None,
        }
    }

    /// Whether this is a finalized assistant answer
    pub fn is_finalized(&self) -> bool {
        self.sources.is_some()
    }

    /// Source citations (empty when none or not yet finalized)
    pub fn sources(&self) -> &[String] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

/// An answer split into its body and trailing source citations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_has_no_sources() {
        let msg = Message::user("hello");
        assert_eq!(msg.author, Author::User);
        assert!(!msg.is_finalized());
        assert!(msg.sources().is_empty());
    }

    #[test]
    fn test_sources_skipped_when_absent() {
        let json = serde_json::to_value(Message::assistant("partial")).unwrap();
        assert_eq!(json["author"], "assistant");
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn test_finalized_message_serializes_sources() {
        let mut msg = Message::assistant("done");
        msg.sources = Some(vec!["wiki:Paris".into()]);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
        assert!(parsed.is_finalized());
    }
}
