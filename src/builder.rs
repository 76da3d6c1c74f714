//! Result Builder
//!
//! Combines accumulated chunks with the awaited metadata record and the
//! conversation context to produce the canonical [`GenerationResult`]. The
//! streaming and non-streaming paths both go through this builder (wrapped by
//! a backend finalizer), which is what guarantees output parity between them.

use crate::error::LlmError;
use crate::streaming::ChunkAccumulator;
use crate::types::{
    AssistantMessage, Chunk, ContentPart, GenerationResult, Message, MetadataRecord, ModelId,
};

/// Inputs the builder needs beyond chunks and metadata.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub model: ModelId,
    pub context: Vec<Message>,
}

impl BuildContext {
    pub fn new(model: ModelId, context: Vec<Message>) -> Self {
        Self { model, context }
    }
}

/// Whether accumulated text classifies as a single structured JSON object.
///
/// Kept compatible with the original behavior: trim, then check for a
/// leading `{` and trailing `}`. This is a shape heuristic, not a JSON
/// well-formedness check, and it can misclassify free text that happens to
/// start and end with braces. Known weak point; hardening it would silently
/// change observable classification.
fn looks_structured(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Build the canonical result from an ordered chunk sequence and the final
/// metadata record. Tolerates an empty chunk list and a fully-degraded
/// metadata record; neither is an error.
pub fn build_result(
    chunks: &[Chunk],
    metadata: &MetadataRecord,
    ctx: &BuildContext,
) -> Result<GenerationResult, LlmError> {
    let out = ChunkAccumulator::accumulate(chunks).finalize();

    let mut structured_object = None;
    let mut content_parts = Vec::new();

    if out.tool_calls.is_empty() && looks_structured(&out.text) {
        match serde_json::from_str::<serde_json::Value>(out.text.trim()) {
            Ok(value) => {
                // Structured-only output: a single object part, no
                // text/thinking parts.
                structured_object = Some(value);
            }
            Err(e) => {
                tracing::debug!(error = %e, "brace-delimited text did not parse; keeping as text");
            }
        }
    }

    match &structured_object {
        Some(value) => content_parts.push(ContentPart::object(value.clone())),
        None => {
            if !out.text.is_empty() {
                content_parts.push(ContentPart::text(&out.text));
            }
            if !out.thinking.is_empty() {
                content_parts.push(ContentPart::thinking(&out.thinking));
            }
        }
    }

    let tool_calls = if out.tool_calls.is_empty() {
        None
    } else {
        Some(out.tool_calls)
    };

    Ok(GenerationResult {
        id: uuid::Uuid::new_v4().to_string(),
        model: ctx.model.clone(),
        created: chrono::Utc::now(),
        context: ctx.context.clone(),
        message: AssistantMessage::new(content_parts, tool_calls),
        structured_object,
        usage: metadata.usage.clone(),
        finish_reason: metadata.finish_reason.clone(),
        provider: metadata.provider.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FinishReason, Usage};
    use serde_json::json;

    fn ctx() -> BuildContext {
        BuildContext::new(ModelId::custom("test", "test-model"), vec![])
    }

    #[test]
    fn empty_chunks_and_degraded_metadata_build_an_empty_result() {
        let result = build_result(&[], &MetadataRecord::degraded(), &ctx()).unwrap();
        assert!(result.message.content_parts.is_empty());
        assert!(result.message.tool_calls.is_none());
        assert!(result.usage.is_none());
        assert!(result.finish_reason.is_none());
        assert!(result.structured_object.is_none());
    }

    #[test]
    fn text_then_thinking_part_ordering() {
        let chunks = vec![
            Chunk::thinking("pondering"),
            Chunk::content("The answer is 42"),
        ];
        let result = build_result(&chunks, &MetadataRecord::degraded(), &ctx()).unwrap();
        assert_eq!(
            result.message.content_parts,
            vec![
                ContentPart::text("The answer is 42"),
                ContentPart::thinking("pondering"),
            ]
        );
    }

    #[test]
    fn structured_output_becomes_a_single_object_part() {
        let chunks = vec![Chunk::content("  {\"name\": \"Ada\"}  ")];
        let result = build_result(&chunks, &MetadataRecord::degraded(), &ctx()).unwrap();
        assert_eq!(result.structured_object, Some(json!({"name": "Ada"})));
        assert_eq!(
            result.message.content_parts,
            vec![ContentPart::object(json!({"name": "Ada"}))]
        );
    }

    #[test]
    fn structured_classification_skipped_when_tool_calls_present() {
        let chunks = vec![
            Chunk::content("{\"name\": \"Ada\"}"),
            Chunk::tool_call(None, "f", json!({}), 0),
        ];
        let result = build_result(&chunks, &MetadataRecord::degraded(), &ctx()).unwrap();
        assert!(result.structured_object.is_none());
        assert!(result.message.content_parts[0].is_text());
        assert_eq!(result.tool_calls().len(), 1);
    }

    #[test]
    fn brace_delimited_free_text_falls_back_to_text_part() {
        let chunks = vec![Chunk::content("{not actually json}")];
        let result = build_result(&chunks, &MetadataRecord::degraded(), &ctx()).unwrap();
        assert!(result.structured_object.is_none());
        assert_eq!(
            result.message.content_parts,
            vec![ContentPart::text("{not actually json}")]
        );
    }

    #[test]
    fn metadata_fields_flow_through() {
        let metadata = MetadataRecord {
            usage: Some(Usage::new(5, 9)),
            finish_reason: Some(FinishReason::Length),
            provider: Default::default(),
        };
        let chunks = vec![Chunk::content("hi")];
        let result = build_result(&chunks, &metadata, &ctx()).unwrap();
        assert_eq!(result.usage, Some(Usage::new(5, 9)));
        assert_eq!(result.finish_reason, Some(FinishReason::Length));
    }
}
