//! Canonical chunk representation
//!
//! A `Chunk` is the atomic unit of decoded output. Backend-specific decoders
//! turn raw transport events into chunks; the accumulator folds them back
//! into a message. Chunk order is significant and must be preserved: text is
//! concatenated and tool-argument fragments are reassembled in arrival order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{FinishReason, Usage};

/// Well-known keys inside `Chunk::Meta` fields.
///
/// The meta map is deliberately open: backends may carry additional keys, and
/// anything the core does not recognize is passed through as opaque provider
/// metadata. These constants are the vocabulary the core itself interprets.
pub mod meta_keys {
    /// Terminal marker: the stream has logically ended.
    pub const TERMINAL: &str = "terminal";
    /// Provider-reported finish reason (string form).
    pub const FINISH_REASON: &str = "finish_reason";
    /// Usage snapshot (serialized [`Usage`](super::Usage)); later snapshots supersede earlier ones.
    pub const USAGE: &str = "usage";
    /// Tool-argument fragment: `{ "index": n, "fragment": "..." }`.
    pub const TOOL_CALL_FRAGMENT: &str = "tool_call_fragment";
    /// Continuation/response identifier for stateful backends.
    pub const RESPONSE_ID: &str = "response_id";
    /// Backend configuration fingerprint.
    pub const SYSTEM_FINGERPRINT: &str = "system_fingerprint";
    /// Prompt tokens served from a provider-side cache.
    pub const CACHE_READ_INPUT_TOKENS: &str = "cache_read_input_tokens";
    /// The custom stop sequence that ended generation.
    pub const STOP_SEQUENCE: &str = "stop_sequence";
    /// Whether the provider blocked output on safety grounds.
    pub const SAFETY_BLOCKED: &str = "safety_blocked";
}

/// One atomic unit of decoded streaming output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// A fragment of assistant-visible text.
    Content { text: String },
    /// A fragment of internal reasoning text (backend-dependent).
    Thinking { text: String },
    /// A tool invocation announcement. `arguments` may be empty and refined
    /// by later `Meta` fragments carrying the same `index`.
    ToolCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        #[serde(default)]
        arguments: Value,
        /// Backend-assigned ordinal of this tool call within the turn.
        index: usize,
    },
    /// Out-of-band signal: terminal marker, finish reason, usage snapshot,
    /// tool-argument fragment, or backend-specific metadata.
    Meta { fields: Map<String, Value> },
}

impl Chunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        Self::Thinking { text: text.into() }
    }

    pub fn tool_call(
        id: Option<String>,
        name: impl Into<String>,
        arguments: Value,
        index: usize,
    ) -> Self {
        Self::ToolCall {
            id,
            name: name.into(),
            arguments,
            index,
        }
    }

    pub fn meta(fields: Map<String, Value>) -> Self {
        Self::Meta { fields }
    }

    /// Meta chunk carrying only the terminal marker.
    pub fn terminal() -> Self {
        let mut fields = Map::new();
        fields.insert(meta_keys::TERMINAL.to_string(), Value::Bool(true));
        Self::Meta { fields }
    }

    /// Meta chunk carrying a provider-reported finish reason string.
    pub fn finish_reason(reason: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(
            meta_keys::FINISH_REASON.to_string(),
            Value::String(reason.into()),
        );
        Self::Meta { fields }
    }

    /// Meta chunk carrying a usage snapshot.
    pub fn usage(usage: &Usage) -> Self {
        let mut fields = Map::new();
        fields.insert(
            meta_keys::USAGE.to_string(),
            serde_json::to_value(usage).unwrap_or(Value::Null),
        );
        Self::Meta { fields }
    }

    /// Meta chunk carrying a tool-argument fragment for the call at `index`.
    pub fn tool_args_fragment(index: usize, fragment: impl Into<String>) -> Self {
        let mut fields = Map::new();
        let mut payload = Map::new();
        payload.insert("index".to_string(), Value::from(index as u64));
        payload.insert("fragment".to_string(), Value::String(fragment.into()));
        fields.insert(
            meta_keys::TOOL_CALL_FRAGMENT.to_string(),
            Value::Object(payload),
        );
        Self::Meta { fields }
    }

    /// Whether this chunk carries the terminal marker.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Meta { fields } => fields
                .get(meta_keys::TERMINAL)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Finish reason carried by this chunk, if any.
    pub fn meta_finish_reason(&self) -> Option<FinishReason> {
        match self {
            Self::Meta { fields } => fields
                .get(meta_keys::FINISH_REASON)
                .and_then(Value::as_str)
                .map(FinishReason::from_provider_str),
            _ => None,
        }
    }

    /// Usage snapshot carried by this chunk, if any.
    pub fn meta_usage(&self) -> Option<Usage> {
        match self {
            Self::Meta { fields } => fields
                .get(meta_keys::USAGE)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            _ => None,
        }
    }

    /// Tool-argument fragment carried by this chunk, if any.
    pub fn meta_tool_fragment(&self) -> Option<(usize, &str)> {
        match self {
            Self::Meta { fields } => {
                let payload = fields.get(meta_keys::TOOL_CALL_FRAGMENT)?.as_object()?;
                let index = payload.get("index")?.as_u64()? as usize;
                let fragment = payload.get("fragment")?.as_str()?;
                Some((index, fragment))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_marker_round_trips() {
        let chunk = Chunk::terminal();
        assert!(chunk.is_terminal());
        assert!(!Chunk::content("hi").is_terminal());
    }

    #[test]
    fn finish_reason_meta_parses_to_unified_enum() {
        let chunk = Chunk::finish_reason("tool_use");
        assert_eq!(chunk.meta_finish_reason(), Some(FinishReason::ToolCalls));
    }

    #[test]
    fn tool_fragment_meta_exposes_index_and_text() {
        let chunk = Chunk::tool_args_fragment(2, "{\"a\":");
        assert_eq!(chunk.meta_tool_fragment(), Some((2, "{\"a\":")));
        assert_eq!(Chunk::content("x").meta_tool_fragment(), None);
    }

    #[test]
    fn usage_meta_survives_serialization() {
        let usage = Usage::new(10, 4);
        let chunk = Chunk::usage(&usage);
        assert_eq!(chunk.meta_usage(), Some(usage));
    }
}
