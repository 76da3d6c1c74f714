//! Chunk Accumulator
//!
//! Folds an ordered chunk sequence into concatenated text, concatenated
//! thinking text, and reconstructed tool invocations. Fragmented tool
//! arguments are reassembled by position: fragments for the same backend
//! ordinal are concatenated in arrival order and parsed once, when the
//! accumulator finalizes.

use std::collections::HashMap;

use serde_json::Value;

use crate::types::{Chunk, ToolCall};

/// A tool invocation under reconstruction.
///
/// `index` is the backend-assigned ordinal used only to match argument
/// fragments; it is dropped from the public shape on finalize.
#[derive(Debug, Clone)]
pub struct ToolCallDraft {
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
    pub index: usize,
}

/// Final output of accumulation.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedOutput {
    pub text: String,
    pub thinking: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Pure fold over a chunk sequence. No I/O.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    text: String,
    thinking: String,
    drafts: Vec<ToolCallDraft>,
    arg_fragments: HashMap<usize, String>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an entire sequence in order.
    pub fn accumulate<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> Self {
        let mut acc = Self::new();
        for chunk in chunks {
            acc.push(chunk);
        }
        acc
    }

    /// Fold one chunk. Order-dependent: callers must push in arrival order.
    pub fn push(&mut self, chunk: &Chunk) {
        match chunk {
            Chunk::Content { text } => self.text.push_str(text),
            Chunk::Thinking { text } => self.thinking.push_str(text),
            Chunk::ToolCall {
                id,
                name,
                arguments,
                index,
            } => {
                self.drafts.push(ToolCallDraft {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                    index: *index,
                });
            }
            Chunk::Meta { .. } => {
                if let Some((index, fragment)) = chunk.meta_tool_fragment() {
                    tracing::trace!(index, bytes = fragment.len(), "tool argument fragment");
                    self.arg_fragments
                        .entry(index)
                        .or_default()
                        .push_str(fragment);
                }
            }
        }
    }

    /// Accumulated assistant-visible text so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Accumulated thinking text so far.
    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    /// Finalize into the accumulated output.
    ///
    /// For each draft, a non-empty concatenated fragment replaces the draft
    /// arguments when it parses as JSON; unparsable fragments degrade to an
    /// empty argument map rather than failing the whole result. A draft with
    /// no matching fragment keeps its own arguments verbatim.
    pub fn finalize(mut self) -> AccumulatedOutput {
        let mut tool_calls = Vec::with_capacity(self.drafts.len());
        for draft in self.drafts {
            let arguments = match self.arg_fragments.remove(&draft.index) {
                Some(fragment) if !fragment.is_empty() => {
                    match serde_json::from_str::<Value>(&fragment) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::debug!(
                                index = draft.index,
                                error = %e,
                                "tool argument fragment did not parse; degrading to empty map"
                            );
                            Value::Object(serde_json::Map::new())
                        }
                    }
                }
                _ => draft.arguments,
            };
            tool_calls.push(ToolCall {
                id: draft.id,
                name: draft.name,
                arguments,
            });
        }
        AccumulatedOutput {
            text: self.text,
            thinking: self.thinking,
            tool_calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_sequence_yields_empty_output() {
        let out = ChunkAccumulator::accumulate([].iter()).finalize();
        assert_eq!(out.text, "");
        assert_eq!(out.thinking, "");
        assert!(out.tool_calls.is_empty());
    }

    #[test]
    fn text_and_thinking_concatenate_in_order() {
        let chunks = vec![
            Chunk::content("Hel"),
            Chunk::thinking("let me "),
            Chunk::content("lo"),
            Chunk::thinking("think"),
        ];
        let out = ChunkAccumulator::accumulate(&chunks).finalize();
        assert_eq!(out.text, "Hello");
        assert_eq!(out.thinking, "let me think");
    }

    #[test]
    fn fragments_reassemble_in_arrival_order() {
        let chunks = vec![
            Chunk::tool_call(Some("call_1".into()), "f", json!({}), 0),
            Chunk::tool_args_fragment(0, "{\"a\":"),
            Chunk::tool_args_fragment(0, "1}"),
        ];
        let out = ChunkAccumulator::accumulate(&chunks).finalize();
        assert_eq!(out.tool_calls.len(), 1);
        assert_eq!(out.tool_calls[0].arguments, json!({"a": 1}));
        // Equal to parsing the unfragmented string directly.
        assert_eq!(
            out.tool_calls[0].arguments,
            serde_json::from_str::<Value>("{\"a\":1}").unwrap()
        );
    }

    #[test]
    fn unparsable_fragment_degrades_to_empty_map() {
        let chunks = vec![
            Chunk::tool_call(None, "f", json!({}), 0),
            Chunk::tool_args_fragment(0, "{\"a\": not json"),
        ];
        let out = ChunkAccumulator::accumulate(&chunks).finalize();
        assert_eq!(out.tool_calls[0].arguments, json!({}));
    }

    #[test]
    fn draft_without_fragment_keeps_own_arguments() {
        let chunks = vec![Chunk::tool_call(
            Some("call_1".into()),
            "lookup",
            json!({"q": "rust"}),
            3,
        )];
        let out = ChunkAccumulator::accumulate(&chunks).finalize();
        assert_eq!(out.tool_calls[0].arguments, json!({"q": "rust"}));
        assert_eq!(out.tool_calls[0].id.as_deref(), Some("call_1"));
    }

    #[test]
    fn fragments_for_distinct_indices_stay_separate() {
        let chunks = vec![
            Chunk::tool_call(None, "a", json!({}), 0),
            Chunk::tool_call(None, "b", json!({}), 1),
            Chunk::tool_args_fragment(1, "{\"x\":2}"),
            Chunk::tool_args_fragment(0, "{\"y\":3}"),
        ];
        let out = ChunkAccumulator::accumulate(&chunks).finalize();
        assert_eq!(out.tool_calls[0].arguments, json!({"y": 3}));
        assert_eq!(out.tool_calls[1].arguments, json!({"x": 2}));
    }
}
