//! Canonical result types
//!
//! A `GenerationResult` has the same shape whether the underlying exchange
//! was streamed or not. It is an immutable, independently-owned value; it
//! retains no reference to the transport or the chunk stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{FinishReason, Message, MessageRole, ModelId, Usage};
use super::metadata::ProviderMetadata;

/// One part of the assistant message's visible content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Assistant-visible text.
    Text { text: String },
    /// Internal reasoning text.
    Thinking { text: String },
    /// Structured output: the whole reply was a single JSON object.
    Object { value: Value },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        Self::Thinking { text: text.into() }
    }

    pub fn object(value: Value) -> Self {
        Self::Object { value }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// A reconstructed tool invocation.
///
/// `arguments` is always a complete JSON value: fragmented argument payloads
/// have been reassembled and parsed by the accumulator before this type is
/// ever constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// The assistant turn produced by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: MessageRole,
    pub content_parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Side metadata a subsequent turn may need (e.g. a continuation
    /// identifier on stateful backends).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

impl AssistantMessage {
    pub(crate) fn new(content_parts: Vec<ContentPart>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content_parts,
            tool_calls,
            metadata: serde_json::Map::new(),
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.content_parts {
            if let ContentPart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Canonical result of one exchange, identical in shape for the streaming
/// and non-streaming code paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Opaque result identifier.
    pub id: String,
    /// Model identity the exchange ran against.
    pub model: ModelId,
    /// When this result was assembled.
    pub created: DateTime<Utc>,
    /// Conversation context the exchange was issued with, carried through.
    pub context: Vec<Message>,
    /// The assistant turn.
    pub message: AssistantMessage,
    /// Parsed structured output, when the reply classified as a single JSON
    /// object with no tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_object: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Backend-specific metadata.
    #[serde(default)]
    pub provider: ProviderMetadata,
}

impl GenerationResult {
    /// Concatenated assistant-visible text.
    pub fn text(&self) -> String {
        self.message.text()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.message.has_tool_calls()
    }

    /// Reconstructed tool calls, empty when the turn requested none.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.message.tool_calls.as_deref().unwrap_or(&[])
    }

    /// The assistant turn as a context message for a follow-up exchange.
    pub fn to_context_message(&self) -> Message {
        Message {
            role: MessageRole::Assistant,
            content: self.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_message_text_concatenates_text_parts_only() {
        let message = AssistantMessage::new(
            vec![
                ContentPart::text("Hello"),
                ContentPart::thinking("hmm"),
                ContentPart::text(" world"),
            ],
            None,
        );
        assert_eq!(message.text(), "Hello world");
        assert!(!message.has_tool_calls());
    }

    #[test]
    fn empty_tool_call_list_does_not_count_as_tool_calls() {
        let message = AssistantMessage::new(vec![], Some(vec![]));
        assert!(!message.has_tool_calls());
    }
}
