//! Whole-message reassembly across partial text-frame deliveries.

use bytes::BytesMut;
use tracing::debug;

use crate::message::Message;

/// Accumulates text payload bytes until a complete JSON object decodes.
///
/// One message may arrive split across several frames, so each delivery is
/// appended to a partial buffer and the concatenation is re-tried. The
/// buffer is owned exclusively by the read pump. No size bound is enforced
/// here: message-size limiting is the transport's responsibility and happens
/// before bytes ever reach this type.
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: BytesMut,
}

impl Reassembler {
    /// Create an empty reassembler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Append `bytes` and attempt a decode of the concatenated buffer.
    ///
    /// If the concatenation does not decode, the newest bytes are retried
    /// alone: a clean unit abandons whatever irrecoverable partial came
    /// before it and resynchronizes the stream. Returns `Some` exactly when
    /// a complete message decoded; the buffer is empty again afterwards.
    ///
    /// An incomplete split and permanently malformed input are not
    /// distinguished: both accumulate until a later delivery completes the
    /// buffer or decodes on its own.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Message> {
        self.buffer.extend_from_slice(bytes);

        if let Ok(message) = serde_json::from_slice::<Message>(&self.buffer) {
            self.buffer.clear();
            return Some(message);
        }

        // Retry the newest delivery alone, dropping a stale partial prefix.
        if self.buffer.len() > bytes.len() {
            if let Ok(message) = serde_json::from_slice::<Message>(bytes) {
                debug!(
                    discarded = self.buffer.len() - bytes.len(),
                    "dropping stale partial message"
                );
                self.buffer.clear();
                return Some(message);
            }
        }

        None
    }

    /// Whether an incomplete message is currently buffered.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Number of bytes currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any buffered partial.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
