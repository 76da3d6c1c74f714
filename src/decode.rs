//! Decoder seams
//!
//! The wire-level decoders are implemented per backend, outside this core.
//! These traits define what the core consumes: a pure, total per-event
//! decode function for streams, and a complete-body decode function for the
//! non-streaming path.

use bytes::Bytes;

use crate::error::LlmError;
use crate::types::{Chunk, MetadataRecord, ModelId};

/// One raw transport event, before backend-specific decoding.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// A server-sent event.
    Sse(eventsource_stream::Event),
    /// A binary event-stream frame (e.g. AWS event-stream framing).
    Frame(Bytes),
}

impl RawEvent {
    /// Convenience constructor for an SSE event with the given type and data.
    pub fn sse(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Sse(eventsource_stream::Event {
            event: event.into(),
            data: data.into(),
            id: String::new(),
            retry: None,
        })
    }

    pub fn frame(payload: impl Into<Bytes>) -> Self {
        Self::Frame(payload.into())
    }
}

/// Turns one raw transport event into zero or more canonical chunks.
///
/// Implementations must be total: unrecognized, empty, or malformed events
/// decode to an empty list, never an error. Decode failures are absorbed at
/// this seam.
pub trait StreamEventDecoder: Send + Sync {
    fn decode_event(&self, raw: &RawEvent, model: &ModelId) -> Vec<Chunk>;
}

/// Turns one complete response body into the chunk list and metadata record
/// the non-streaming path feeds to the same builder and finalizer as the
/// streaming path.
pub trait ResponseDecoder: Send + Sync {
    fn decode_body(
        &self,
        body: &[u8],
        model: &ModelId,
    ) -> Result<(Vec<Chunk>, MetadataRecord), LlmError>;
}
