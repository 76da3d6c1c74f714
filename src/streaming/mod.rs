//! Streaming Module
//!
//! Everything that touches live chunk sequences:
//! - The chunk accumulator and tool-argument reassembly
//! - The multi-reader metadata handle and its collector
//! - Cancellation handles
//! - The streaming façade and the exchange factory

mod accumulator;
mod cancel;
mod facade;
mod factory;
mod handle;

pub use accumulator::{AccumulatedOutput, ChunkAccumulator, ToolCallDraft};
pub use cancel::{make_cancellable_stream, CancelHandle};
pub use facade::{ChunkStream, StreamCallbacks, StreamHandle};
pub use factory::{spawn_exchange, ExchangeOptions, RawEventStream};
pub use handle::{metadata_channel, MetadataCollector, MetadataHandle, MetadataSink};
