//! Error Handling Module
//!
//! Error taxonomy for the normalization core. Recoverable conditions
//! (malformed events, unparsable tool arguments, missing metadata fields)
//! are absorbed with safe defaults close to where they occur and never show
//! up here; only irrecoverable failures surface to the caller.

use thiserror::Error;

/// Errors surfaced by the normalization core.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure while draining a chunk stream.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Failed to parse provider data that was required to continue.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An await exceeded its configured bound.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The chunk sequence was already drained once. The sequence is
    /// single-pass; a second drain attempt is a programmer error and fails
    /// loudly instead of silently yielding nothing.
    #[error("Stream already consumed: {0}")]
    StreamConsumed(String),

    /// The exchange was cancelled before completion.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Whether this error came from the double-drain guard.
    pub fn is_stream_consumed(&self) -> bool {
        matches!(self, Self::StreamConsumed(_))
    }
}
