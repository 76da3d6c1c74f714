//! Estuary: canonical-result normalization for LLM backends
//!
//! Different text-generation backends stream tokens with different event
//! framing, fragment tool-call arguments across many events, report
//! completion status inconsistently, and impose backend-specific rules on
//! what a legal assistant turn looks like. This crate folds all of that into
//! one canonical [`GenerationResult`](types::GenerationResult) with identical
//! shape whether the underlying call was streamed or not.
//!
//! The pipeline: backend decoders (external, see [`decode`]) turn raw
//! transport events into [`Chunk`](types::Chunk)s; the
//! [`ChunkAccumulator`](streaming::ChunkAccumulator) folds them back into
//! text, thinking text, and reassembled tool calls; the result builder
//! combines that with the concurrently-collected
//! [`MetadataRecord`](types::MetadataRecord); and a per-backend
//! [`Finalizer`](finalizers::Finalizer) applies the corrections each backend
//! needs.
//!
//! # Streaming
//!
//! ```rust,no_run
//! # use estuary::prelude::*;
//! # async fn example(mut handle: StreamHandle) -> Result<(), LlmError> {
//! let callbacks = StreamCallbacks::new().on_content(|delta| print!("{delta}"));
//! let result = handle.process(callbacks).await?;
//! println!("finish: {:?}", result.finish_reason);
//! # Ok(())
//! # }
//! ```
//!
//! # Non-streaming
//!
//! The same builder and finalizer run over a chunk list synthesized from the
//! complete body; see [`complete::build_complete`].

pub mod builder;
pub mod complete;
pub mod decode;
pub mod error;
pub mod finalizers;
pub mod streaming;
pub mod types;

pub use error::LlmError;

/// Convenience re-exports for the common surface.
pub mod prelude {
    pub use crate::complete::{build_complete, complete_from_body};
    pub use crate::error::LlmError;
    pub use crate::streaming::{
        spawn_exchange, ExchangeOptions, StreamCallbacks, StreamHandle,
    };
    pub use crate::types::{
        Chunk, FinishReason, GenerationResult, Message, MetadataRecord, ModelId, ProviderKind,
        Usage,
    };
}
