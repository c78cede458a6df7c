//! Error types for rill-chat

use thiserror::Error;

/// Result type alias using rill-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a conversation
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the query client layer
    #[error(transparent)]
    Client(#[from] rill_client::Error),

    /// The submitted question was empty after trimming
    #[error("Question is empty")]
    EmptyQuestion,

    /// A question is already being answered
    #[error("Still answering the previous question")]
    Busy,

    /// A second answer was started while one is still in progress
    #[error("Answer at message {0} is still in progress")]
    AnswerInProgress(usize),

    /// A write targeted a message that is not the in-progress answer
    #[error("Message {0} is not the in-progress answer")]
    NotInProgress(usize),

    /// A position past the end of the conversation
    #[error("No message at position {0}")]
    NoSuchMessage(usize),

    /// The answer session ended before any message was written
    #[error("Answer session already closed")]
    SessionClosed,
}
