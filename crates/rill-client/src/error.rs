//! Error types for rill-client

use thiserror::Error;

/// Result type alias using rill-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// The three ways a question can fail once it has been handed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-success status or a body that cannot be streamed
    TransportRejected,
    /// The transport broke after the response started
    StreamFailure,
    /// Bytes that are not valid UTF-8 even after cross-chunk buffering
    DecodeFailure,
}

/// Errors that can occur while talking to the query backend
#[derive(Error, Debug)]
pub enum Error {
    /// The backend answered with a status or body we cannot consume
    #[error("network response not ok (status: {status})")]
    TransportRejected { status: u16 },

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body broke off mid-stream
    #[error("stream failed: {0}")]
    Stream(String),

    /// The connect or overall request timeout fired
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Malformed UTF-8 in the response body
    #[error("malformed UTF-8 in response at byte {offset}")]
    Decode { offset: usize },

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a stream failure from anything displayable
    pub fn stream(message: impl std::fmt::Display) -> Self {
        Self::Stream(message.to_string())
    }

    /// Wrap a transport error, keeping timeouts distinct
    pub(crate) fn transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Http(error)
        }
    }

    /// Classify this error into one of the user-facing failure kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TransportRejected { .. }
            | Error::Http(_)
            | Error::Json(_)
            | Error::InvalidConfig(_) => ErrorKind::TransportRejected,
            Error::Stream(_) | Error::Timeout(_) => ErrorKind::StreamFailure,
            Error::Decode { .. } => ErrorKind::DecodeFailure,
        }
    }
}
