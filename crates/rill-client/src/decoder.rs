//! Incremental UTF-8 decoding across chunk boundaries

use crate::error::{Error, Result};

/// Decodes a byte stream chunk by chunk.
///
/// A multi-byte character whose encoding is cut by a chunk edge is held back
/// until the rest of it arrives, so concatenating every returned string gives
/// back the exact text the producer wrote. Bytes that can never form a valid
/// character are reported as [`Error::Decode`] instead of being replaced.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Trailing bytes of an incomplete character
    pending: Vec<u8>,
    /// Bytes already decoded, used to report error offsets
    consumed: usize,
}

impl Utf8Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk in streaming mode.
    ///
    /// Returns all text that is complete so far; an incomplete trailing
    /// sequence is buffered for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(chunk);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) => {
                if e.error_len().is_some() {
                    return Err(Error::Decode {
                        offset: self.consumed + e.valid_up_to(),
                    });
                }
                e.valid_up_to()
            }
        };

        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| Error::Decode {
                offset: self.consumed + e.valid_up_to(),
            })?
            .to_owned();
        self.pending.drain(..valid);
        self.consumed += valid;

        Ok(text)
    }

    /// Flush at end of stream.
    ///
    /// Anything still buffered here is a truncated character, which is a
    /// decode failure rather than something to paper over.
    pub fn finish(&mut self) -> Result<String> {
        if self.pending.is_empty() {
            return Ok(String::new());
        }
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_owned();
                self.consumed += self.pending.len();
                self.pending.clear();
                Ok(text)
            }
            Err(e) => Err(Error::Decode {
                offset: self.consumed + e.valid_up_to(),
            }),
        }
    }
}
