//! Core data types
//!
//! Chunks, identities, metadata records, and the canonical result value.

mod chunk;
mod common;
mod metadata;
mod result;

pub use chunk::{meta_keys, Chunk};
pub use common::{FinishReason, Message, MessageRole, ModelId, ProviderKind, Usage};
pub use metadata::{
    AnthropicMetadata, GeminiMetadata, MetadataRecord, OpenAiMetadata, ProviderMetadata,
};
pub use result::{AssistantMessage, ContentPart, GenerationResult, ToolCall};
