//! Backend Finalizers
//!
//! A finalizer is a small backend-specific correction pass wrapped around the
//! generic result builder: metadata adjustments run before the build, result
//! adjustments after it. Dispatch is an explicit strategy table keyed on
//! backend identity, so every known backend stays enumerable and testable in
//! isolation.

mod anthropic;
mod gemini;
mod openai;

use std::collections::HashMap;
use std::sync::Arc;

pub use anthropic::AnthropicFinalizer;
pub use gemini::GeminiFinalizer;
pub use openai::OpenAiFinalizer;

use crate::builder::{build_result, BuildContext};
use crate::error::LlmError;
use crate::types::{
    Chunk, ContentPart, FinishReason, GenerationResult, MetadataRecord, ModelId, ProviderKind,
};

/// Backend-specific correction pass applied around the generic builder.
pub trait Finalizer: Send + Sync {
    /// Adjust metadata before the generic build runs.
    fn pre_adjust(&self, _chunks: &[Chunk], _metadata: &mut MetadataRecord) {}

    /// Adjust the built result.
    fn post_adjust(&self, _result: &mut GenerationResult) {}

    /// Run pre-adjustments, the generic builder, then post-adjustments.
    fn finalize(
        &self,
        chunks: &[Chunk],
        metadata: &MetadataRecord,
        ctx: &BuildContext,
    ) -> Result<GenerationResult, LlmError> {
        let mut metadata = metadata.clone();
        self.pre_adjust(chunks, &mut metadata);
        let mut result = build_result(chunks, &metadata, ctx)?;
        self.post_adjust(&mut result);
        Ok(result)
    }
}

/// Finalizer for backends with no known corrections. Behaviorally identical
/// to calling the result builder directly.
#[derive(Debug, Default)]
pub struct DefaultFinalizer;

impl Finalizer for DefaultFinalizer {}

/// Select the finalizer for a model identity. Unknown backends get the
/// default finalizer.
pub fn select_finalizer(model: &ModelId) -> &'static dyn Finalizer {
    tracing::debug!(provider = %model.provider, stateful = model.stateful, "selecting finalizer");
    match model.provider {
        ProviderKind::OpenAi => &OpenAiFinalizer,
        ProviderKind::Anthropic => &AnthropicFinalizer,
        ProviderKind::Gemini => &GeminiFinalizer,
        ProviderKind::Custom(_) => &DefaultFinalizer,
    }
}

/// Extensible finalizer table for callers that register their own backends.
///
/// `select` matches on the provider name; anything unregistered falls back to
/// the default finalizer.
pub struct FinalizerRegistry {
    by_provider: HashMap<String, Arc<dyn Finalizer>>,
    fallback: Arc<dyn Finalizer>,
}

impl FinalizerRegistry {
    /// Registry pre-populated with the known backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            by_provider: HashMap::new(),
            fallback: Arc::new(DefaultFinalizer),
        };
        registry.register("openai", Arc::new(OpenAiFinalizer));
        registry.register("anthropic", Arc::new(AnthropicFinalizer));
        registry.register("gemini", Arc::new(GeminiFinalizer));
        registry
    }

    pub fn register(&mut self, provider: impl Into<String>, finalizer: Arc<dyn Finalizer>) {
        self.by_provider.insert(provider.into(), finalizer);
    }

    pub fn select(&self, model: &ModelId) -> Arc<dyn Finalizer> {
        self.by_provider
            .get(&model.provider.to_string())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for FinalizerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Empty-content legalization.
///
/// Some backends reject a turn whose visible content is completely empty even
/// when a tool call is present; insert a single empty text part so the
/// message is legal to send back.
pub(crate) fn legalize_empty_content(result: &mut GenerationResult) {
    if result.message.has_tool_calls() && result.message.content_parts.is_empty() {
        tracing::debug!("tool-call turn with empty content; inserting empty text part");
        result.message.content_parts.push(ContentPart::text(""));
    }
}

/// Finish-reason misreport correction.
///
/// Some backends report the generic "stop" status even when the turn's actual
/// outcome was a function-call request. If any chunk is a tool call and the
/// reported finish reason is "stop" (tagged or string form), override it to
/// `tool_calls` before building.
pub(crate) fn correct_misreported_tool_finish(chunks: &[Chunk], metadata: &mut MetadataRecord) {
    let has_tool_call = chunks.iter().any(|c| matches!(c, Chunk::ToolCall { .. }));
    let reported_stop = metadata
        .finish_reason
        .as_ref()
        .is_some_and(FinishReason::is_generic_stop);
    if has_tool_call && reported_stop {
        tracing::debug!("finish reason misreported as stop on a tool-call turn; overriding");
        metadata.finish_reason = Some(FinishReason::ToolCalls);
    }
}
