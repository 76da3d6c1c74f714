//! Anthropic finalizer

use super::{legalize_empty_content, Finalizer};
use crate::types::GenerationResult;

/// Corrections for Anthropic backends.
///
/// The API rejects an assistant turn whose content is completely empty, even
/// when the turn carries a tool call, so such turns get a single empty text
/// part.
#[derive(Debug, Default)]
pub struct AnthropicFinalizer;

impl Finalizer for AnthropicFinalizer {
    fn post_adjust(&self, result: &mut GenerationResult) {
        legalize_empty_content(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildContext;
    use crate::types::{Chunk, ContentPart, MetadataRecord, ModelId};
    use serde_json::json;

    #[test]
    fn tool_only_turn_gets_one_empty_text_part() {
        let ctx = BuildContext::new(ModelId::anthropic("claude-x"), vec![]);
        let chunks = vec![Chunk::tool_call(Some("toolu_1".into()), "f", json!({}), 0)];
        let result = AnthropicFinalizer
            .finalize(&chunks, &MetadataRecord::degraded(), &ctx)
            .unwrap();
        assert_eq!(result.message.content_parts, vec![ContentPart::text("")]);
        assert_eq!(result.tool_calls().len(), 1);
    }

    #[test]
    fn turn_with_text_is_untouched() {
        let ctx = BuildContext::new(ModelId::anthropic("claude-x"), vec![]);
        let chunks = vec![
            Chunk::content("Let me check."),
            Chunk::tool_call(Some("toolu_1".into()), "f", json!({}), 0),
        ];
        let result = AnthropicFinalizer
            .finalize(&chunks, &MetadataRecord::degraded(), &ctx)
            .unwrap();
        assert_eq!(
            result.message.content_parts,
            vec![ContentPart::text("Let me check.")]
        );
    }
}
