//! Exchange metadata types
//!
//! A `MetadataRecord` is produced exactly once per exchange, after the
//! exchange is logically complete. Backend-specific fields live in small
//! typed extension records per backend; anything the core does not interpret
//! is preserved in a generic passthrough map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{FinishReason, Usage};

/// Final usage/finish-reason/backend metadata for one exchange.
///
/// A degraded record (all fields empty) is what awaiters receive when the
/// exchange failed or was cancelled before a terminal marker; consumers must
/// tolerate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub provider: ProviderMetadata,
}

impl MetadataRecord {
    /// The degraded record resolved on failure, timeout, or cancellation.
    pub fn degraded() -> Self {
        Self::default()
    }
}

/// Typed per-backend metadata plus an opaque passthrough map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<AnthropicMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiMetadata>,
    /// Backend-opaque fields the core carries through without interpreting.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ProviderMetadata {
    pub fn is_empty(&self) -> bool {
        self.openai.is_none()
            && self.anthropic.is_none()
            && self.gemini.is_none()
            && self.extra.is_empty()
    }

    pub(crate) fn openai_mut(&mut self) -> &mut OpenAiMetadata {
        self.openai.get_or_insert_with(Default::default)
    }

    pub(crate) fn anthropic_mut(&mut self) -> &mut AnthropicMetadata {
        self.anthropic.get_or_insert_with(Default::default)
    }

    pub(crate) fn gemini_mut(&mut self) -> &mut GeminiMetadata {
        self.gemini.get_or_insert_with(Default::default)
    }
}

/// OpenAI-family extension record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiMetadata {
    /// Response identifier a later turn can reference on stateful
    /// continuation-style APIs instead of resending full history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Backend configuration fingerprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

/// Anthropic extension record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnthropicMetadata {
    /// Prompt tokens served from the provider-side cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
    /// The custom stop sequence that ended generation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
}

/// Gemini extension record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeminiMetadata {
    /// Whether the provider blocked output on safety grounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_blocked: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_record_is_fully_empty() {
        let record = MetadataRecord::degraded();
        assert!(record.usage.is_none());
        assert!(record.finish_reason.is_none());
        assert!(record.provider.is_empty());
    }

    #[test]
    fn provider_metadata_serializes_sparsely() {
        let mut meta = ProviderMetadata::default();
        meta.openai_mut().response_id = Some("resp_1".to_string());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["openai"]["response_id"], "resp_1");
        assert!(json.get("anthropic").is_none());
        assert!(json.get("extra").is_none());
    }
}
