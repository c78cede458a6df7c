//! Turning a response body into a stream of decoded text fragments

use crate::decoder::Utf8Decoder;
use crate::error::{Error, Result};
use async_stream::stream;
use bytes::Bytes;
use futures::StreamExt;
use std::pin::Pin;
use tokio_stream::Stream;

/// A stream of raw body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A stream of decoded fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Events emitted while decoding a response body
#[derive(Debug)]
pub enum StreamEvent {
    /// Newly decoded text, in order
    Fragment { text: String },
    /// The body ended cleanly and every byte was decoded
    Done,
    /// The transport or the decoder failed; nothing follows
    Failed { error: Error },
}

impl StreamEvent {
    /// Check if this is a terminal event (Done or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed { .. })
    }
}

/// Decode a body stream into text fragments.
///
/// Every fragment is non-empty. The stream always ends with exactly one
/// terminal event: `Done` after a clean close, `Failed` on a transport error
/// or malformed bytes.
pub fn decode_stream<S>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    Box::pin(stream! {
        let mut body = Box::pin(body);
        let mut decoder = Utf8Decoder::new();
        let mut received = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    tracing::warn!("Response body failed after {} bytes: {}", received, error);
                    yield StreamEvent::Failed { error };
                    return;
                }
            };
            received += chunk.len();

            match decoder.decode(&chunk) {
                Ok(text) => {
                    if !text.is_empty() {
                        yield StreamEvent::Fragment { text };
                    }
                }
                Err(error) => {
                    tracing::warn!("Undecodable response body: {}", error);
                    yield StreamEvent::Failed { error };
                    return;
                }
            }
        }

        match decoder.finish() {
            Ok(text) => {
                if !text.is_empty() {
                    yield StreamEvent::Fragment { text };
                }
                tracing::debug!("Response body complete ({} bytes)", received);
                yield StreamEvent::Done;
            }
            Err(error) => {
                tracing::warn!("Response body ended mid-character: {}", error);
                yield StreamEvent::Failed { error };
            }
        }
    })
}
