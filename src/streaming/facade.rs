//! Streaming Façade
//!
//! `StreamHandle` bundles the live chunk sequence, the metadata handle, a
//! cancellation handle, and everything needed to re-run the result builder
//! (model identity, conversation context). The chunk sequence is single-pass:
//! any of the draining operations consumes it, and a second drain attempt
//! fails loudly with [`LlmError::StreamConsumed`].

use std::pin::Pin;

use futures::Stream;
use futures_util::StreamExt;

use super::cancel::CancelHandle;
use super::handle::MetadataHandle;
use crate::builder::BuildContext;
use crate::error::LlmError;
use crate::finalizers::select_finalizer;
use crate::types::{Chunk, FinishReason, GenerationResult, Message, ModelId, Usage};

/// The live chunk sequence for one exchange.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, LlmError>> + Send>>;

/// Optional per-chunk callbacks invoked synchronously during [`StreamHandle::process`],
/// for forwarding deltas to a live UI while the result is assembled.
#[derive(Default)]
pub struct StreamCallbacks {
    pub on_content: Option<Box<dyn FnMut(&str) + Send>>,
    pub on_thinking: Option<Box<dyn FnMut(&str) + Send>>,
}

impl StreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_content(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_content = Some(Box::new(f));
        self
    }

    pub fn on_thinking(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_thinking = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_content", &self.on_content.is_some())
            .field("on_thinking", &self.on_thinking.is_some())
            .finish()
    }
}

/// Outward-facing handle for one streaming exchange.
pub struct StreamHandle {
    stream: Option<ChunkStream>,
    metadata: MetadataHandle,
    cancel: CancelHandle,
    model: ModelId,
    context: Vec<Message>,
}

impl StreamHandle {
    /// Assemble a handle from caller-owned parts. Callers wiring their own
    /// transport can wrap the stream with
    /// [`make_cancellable_stream`](super::cancel::make_cancellable_stream)
    /// to get a cancel handle that actually stops production.
    pub fn from_parts(
        stream: ChunkStream,
        metadata: MetadataHandle,
        cancel: CancelHandle,
        model: ModelId,
        context: Vec<Message>,
    ) -> Self {
        Self {
            stream: Some(stream),
            metadata,
            cancel,
            model,
            context,
        }
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn context(&self) -> &[Message] {
        &self.context
    }

    /// A clone of the metadata handle, awaitable independently of the stream.
    pub fn metadata_handle(&self) -> MetadataHandle {
        self.metadata.clone()
    }

    /// A clone of the cancel handle, shareable across tasks.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Request cancellation of the underlying exchange. Safe after natural
    /// completion (no-op) and safe to call concurrently with a drain.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn take_stream(&mut self) -> Result<ChunkStream, LlmError> {
        self.stream.take().ok_or_else(|| {
            LlmError::StreamConsumed("the chunk sequence was already drained".to_string())
        })
    }

    /// Lazy projection of assistant-visible text deltas, in order.
    ///
    /// Consumes the single-pass chunk sequence.
    pub fn tokens(&mut self) -> Result<impl Stream<Item = Result<String, LlmError>> + Send, LlmError> {
        let mut inner = self.take_stream()?;
        Ok(async_stream::stream! {
            while let Some(item) = inner.next().await {
                match item {
                    Ok(Chunk::Content { text }) => yield Ok(text),
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        })
    }

    /// Lazy projection of tool-call chunks, in order.
    ///
    /// Consumes the single-pass chunk sequence.
    pub fn tool_calls(
        &mut self,
    ) -> Result<impl Stream<Item = Result<Chunk, LlmError>> + Send, LlmError> {
        let mut inner = self.take_stream()?;
        Ok(async_stream::stream! {
            while let Some(item) = inner.next().await {
                match item {
                    Ok(chunk @ Chunk::ToolCall { .. }) => yield Ok(chunk),
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        })
    }

    /// Drain [`tokens`](Self::tokens) to completion and concatenate.
    pub async fn collect_text(&mut self) -> Result<String, LlmError> {
        let stream = self.tokens()?;
        futures_util::pin_mut!(stream);
        let mut out = String::new();
        while let Some(piece) = stream.next().await {
            out.push_str(&piece?);
        }
        Ok(out)
    }

    /// Drain the full chunk sequence exactly once, invoking the callbacks
    /// synchronously for content and thinking deltas, then await metadata and
    /// run the result builder plus the backend finalizer.
    ///
    /// Callbacks and accumulation share the same single traversal. A
    /// transport failure mid-stream surfaces as an error and discards the
    /// partial accumulation: the contract is all-or-nothing at this layer.
    pub async fn process(
        &mut self,
        mut callbacks: StreamCallbacks,
    ) -> Result<GenerationResult, LlmError> {
        let mut stream = self.take_stream()?;
        let mut chunks = Vec::new();
        while let Some(item) = stream.next().await {
            let chunk = item?;
            match &chunk {
                Chunk::Content { text } => {
                    if let Some(cb) = callbacks.on_content.as_mut() {
                        cb(text);
                    }
                }
                Chunk::Thinking { text } => {
                    if let Some(cb) = callbacks.on_thinking.as_mut() {
                        cb(text);
                    }
                }
                _ => {}
            }
            chunks.push(chunk);
        }
        tracing::debug!(chunks = chunks.len(), "chunk sequence drained");

        let metadata = self.metadata.recv().await;
        let ctx = BuildContext::new(self.model.clone(), self.context.clone());
        select_finalizer(&self.model).finalize(&chunks, &metadata, &ctx)
    }

    /// Materialize the canonical result without live callbacks.
    pub async fn to_result(&mut self) -> Result<GenerationResult, LlmError> {
        self.process(StreamCallbacks::default()).await
    }

    /// Await final usage without draining the chunk sequence.
    pub async fn usage(&self) -> Option<Usage> {
        self.metadata.recv().await.usage
    }

    /// Await the final finish reason without draining the chunk sequence.
    pub async fn finish_reason(&self) -> Option<FinishReason> {
        self.metadata.recv().await.finish_reason
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("model", &self.model)
            .field("consumed", &self.stream.is_none())
            .finish()
    }
}
