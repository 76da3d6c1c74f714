//! Non-streaming path
//!
//! A non-streaming call produces one complete body. The backend decoder turns
//! it into a chunk list and a metadata record, which then go through the same
//! result builder and the same backend finalizer as the streaming path. That
//! shared tail is what guarantees output parity between the two paths.

use crate::builder::BuildContext;
use crate::decode::ResponseDecoder;
use crate::error::LlmError;
use crate::finalizers::select_finalizer;
use crate::types::{Chunk, GenerationResult, Message, MetadataRecord, ModelId};

/// Build the canonical result for an already-decoded complete exchange.
pub fn build_complete(
    chunks: &[Chunk],
    metadata: &MetadataRecord,
    model: &ModelId,
    context: Vec<Message>,
) -> Result<GenerationResult, LlmError> {
    let ctx = BuildContext::new(model.clone(), context);
    select_finalizer(model).finalize(chunks, metadata, &ctx)
}

/// Decode one complete response body and build the canonical result.
pub fn complete_from_body<D: ResponseDecoder>(
    decoder: &D,
    body: &[u8],
    model: &ModelId,
    context: Vec<Message>,
) -> Result<GenerationResult, LlmError> {
    let (chunks, metadata) = decoder.decode_body(body, model)?;
    build_complete(&chunks, &metadata, model, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentPart, FinishReason, Usage};
    use serde_json::json;

    #[test]
    fn complete_path_runs_the_backend_finalizer() {
        let chunks = vec![Chunk::tool_call(Some("call_1".into()), "f", json!({}), 0)];
        let metadata = MetadataRecord {
            usage: Some(Usage::new(3, 1)),
            finish_reason: Some(FinishReason::Stop),
            provider: Default::default(),
        };
        let result = build_complete(
            &chunks,
            &metadata,
            &ModelId::gemini("gemini-pro"),
            vec![],
        )
        .unwrap();
        // Gemini corrections applied: finish reason override and
        // empty-content legalization.
        assert_eq!(result.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(result.message.content_parts, vec![ContentPart::text("")]);
        assert_eq!(result.usage, Some(Usage::new(3, 1)));
    }
}
