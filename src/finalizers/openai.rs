//! OpenAI-family finalizer

use serde_json::Value;

use super::{correct_misreported_tool_finish, Finalizer};
use crate::types::{Chunk, GenerationResult, MetadataRecord};

/// Corrections for OpenAI-family backends.
///
/// These backends report `finish_reason: "stop"` through some code paths
/// even when the turn requested a function call. On the stateful
/// continuation-style API (the `stateful` model flag), the response
/// identifier is additionally copied into the message's side metadata so the
/// next turn can reference it instead of resending full history.
#[derive(Debug, Default)]
pub struct OpenAiFinalizer;

impl Finalizer for OpenAiFinalizer {
    fn pre_adjust(&self, chunks: &[Chunk], metadata: &mut MetadataRecord) {
        correct_misreported_tool_finish(chunks, metadata);
    }

    fn post_adjust(&self, result: &mut GenerationResult) {
        if !result.model.stateful {
            return;
        }
        let response_id = result
            .provider
            .openai
            .as_ref()
            .and_then(|m| m.response_id.as_deref())
            .filter(|id| !id.is_empty());
        if let Some(id) = response_id {
            tracing::debug!(response_id = id, "propagating continuation identifier");
            result.message.metadata.insert(
                "previous_response_id".to_string(),
                Value::String(id.to_string()),
            );
        }
    }
}
