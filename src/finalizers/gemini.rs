//! Gemini finalizer

use super::{correct_misreported_tool_finish, legalize_empty_content, Finalizer};
use crate::types::{Chunk, GenerationResult, MetadataRecord};

/// Corrections for Gemini backends.
///
/// Gemini reports `STOP` on function-call turns, and rejects candidate
/// content that is completely empty, so both the finish-reason override and
/// empty-content legalization apply.
#[derive(Debug, Default)]
pub struct GeminiFinalizer;

impl Finalizer for GeminiFinalizer {
    fn pre_adjust(&self, chunks: &[Chunk], metadata: &mut MetadataRecord) {
        correct_misreported_tool_finish(chunks, metadata);
    }

    fn post_adjust(&self, result: &mut GenerationResult) {
        legalize_empty_content(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildContext;
    use crate::types::{ContentPart, FinishReason, ModelId};
    use serde_json::json;

    #[test]
    fn applies_both_corrections_on_a_tool_only_turn() {
        let ctx = BuildContext::new(ModelId::gemini("gemini-pro"), vec![]);
        let chunks = vec![Chunk::tool_call(None, "lookup", json!({"q": 1}), 0)];
        let metadata = MetadataRecord {
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        };
        let result = GeminiFinalizer.finalize(&chunks, &metadata, &ctx).unwrap();
        assert_eq!(result.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(result.message.content_parts, vec![ContentPart::text("")]);
    }
}
