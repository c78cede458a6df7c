//! rill-client: streaming query client
//!
//! Posts a question to a question-answering backend, decodes the streamed
//! response body into text fragments, and splits a finished answer into its
//! body and source citations.

pub mod client;
pub mod decoder;
pub mod error;
pub mod sources;
pub mod stream;
pub mod types;

pub use client::{QueryClient, QueryRequest};
pub use decoder::Utf8Decoder;
pub use error::{Error, ErrorKind, Result};
pub use sources::{SOURCES_DELIMITER, split_answer};
pub use stream::{ByteStream, FragmentStream, StreamEvent, decode_stream};
pub use types::*;
