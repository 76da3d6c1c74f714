//! Exchange factory
//!
//! Wires a raw transport event stream and a backend decoder into a
//! [`StreamHandle`]: chunks flow to the consumer over a bounded channel while
//! a spawned task collects metadata independently, committing it exactly once
//! on terminal marker, stream end, transport failure, or cancellation.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use super::cancel::CancelHandle;
use super::facade::{ChunkStream, StreamHandle};
use super::handle::{metadata_channel, MetadataCollector};
use crate::decode::{RawEvent, StreamEventDecoder};
use crate::error::LlmError;
use crate::types::{Chunk, Message, ModelId};

/// A stream of raw transport events, as produced by the (external) transport
/// layer.
pub type RawEventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, LlmError>> + Send>>;

/// Knobs for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOptions {
    /// Upper bound on any await of the metadata handle. Exceeding it
    /// resolves the handle to a degraded record.
    pub metadata_timeout: Duration,
    /// Capacity of the chunk channel between the exchange task and the
    /// consumer. Forwarding beyond this buffer waits for the consumer;
    /// metadata collection is unaffected by that backpressure.
    pub channel_capacity: usize,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            metadata_timeout: Duration::from_secs(120),
            channel_capacity: 64,
        }
    }
}

/// Forward buffered items without blocking. Stops at a full channel (items
/// stay queued) and reports a closed channel as a dropped consumer.
fn try_flush(
    tx: &mpsc::Sender<Result<Chunk, LlmError>>,
    pending: &mut VecDeque<Result<Chunk, LlmError>>,
) -> bool {
    while let Some(item) = pending.pop_front() {
        match tx.try_send(item) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(item)) => {
                pending.push_front(item);
                break;
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return false,
        }
    }
    true
}

/// Spawn the exchange task and return the façade for it.
///
/// The task drives the raw event source, decodes each event into chunks
/// (malformed events decode to nothing, by the decoder contract), forwards
/// chunks to the consumer, and folds `Meta` signals into the metadata record.
/// Collection runs ahead of forwarding: chunks the consumer has not drained
/// yet are buffered, so usage and finish reason resolve as soon as the
/// transport delivers them, however slowly the chunk sequence is pulled. The
/// metadata sink is committed on every exit path, so awaiters never hang: a
/// cancelled or failed exchange resolves to whatever was collected so far.
///
/// Requires a Tokio runtime.
pub fn spawn_exchange<D>(
    raw: RawEventStream,
    decoder: D,
    model: ModelId,
    context: Vec<Message>,
    options: ExchangeOptions,
) -> StreamHandle
where
    D: StreamEventDecoder + 'static,
{
    let (tx, rx) = mpsc::channel::<Result<Chunk, LlmError>>(options.channel_capacity);
    let (sink, metadata) = metadata_channel(options.metadata_timeout);
    let cancel = CancelHandle::new();
    let token = cancel.token().clone();
    let task_model = model.clone();

    tokio::spawn(async move {
        let mut raw = raw;
        let mut collector = MetadataCollector::new();
        let mut pending: VecDeque<Result<Chunk, LlmError>> = VecDeque::new();
        let mut consumer_gone = false;

        'decode: loop {
            let item = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("exchange cancelled before terminal marker");
                    break 'decode;
                }
                item = raw.next() => item,
            };
            let Some(item) = item else { break };

            match item {
                Ok(event) => {
                    for chunk in decoder.decode_event(&event, &task_model) {
                        collector.observe(&chunk);
                        pending.push_back(Ok(chunk));
                    }
                    if !try_flush(&tx, &mut pending) {
                        // Consumer dropped the stream; stop decoding but
                        // still commit what was collected.
                        consumer_gone = true;
                        break;
                    }
                    if collector.terminal_seen() {
                        tracing::trace!("terminal marker observed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "transport failure mid-stream");
                    pending.push_back(Err(e));
                    break;
                }
            }
        }

        // Commit before draining the buffer: forwarding backpressure must
        // not delay metadata resolution.
        sink.commit(collector.finish());

        if consumer_gone {
            return;
        }
        while let Some(item) = pending.pop_front() {
            let delivered = tokio::select! {
                _ = token.cancelled() => false,
                res = tx.send(item) => res.is_ok(),
            };
            if !delivered {
                break;
            }
        }
    });

    let stream: ChunkStream = Box::pin(async_stream::stream! {
        let mut rx = rx;
        while let Some(item) = rx.recv().await {
            yield item;
        }
    });

    StreamHandle::from_parts(stream, metadata, cancel, model, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, FinishReason, Usage};

    /// Decoder that treats SSE data as a JSON-encoded chunk and ignores
    /// everything else, the way real decoders absorb unknown events.
    struct JsonChunkDecoder;

    impl StreamEventDecoder for JsonChunkDecoder {
        fn decode_event(&self, raw: &RawEvent, _model: &ModelId) -> Vec<Chunk> {
            match raw {
                RawEvent::Sse(event) => serde_json::from_str::<Chunk>(&event.data)
                    .map(|c| vec![c])
                    .unwrap_or_default(),
                RawEvent::Frame(_) => Vec::new(),
            }
        }
    }

    fn raw_stream(chunks: Vec<Chunk>) -> RawEventStream {
        let events: Vec<Result<RawEvent, LlmError>> = chunks
            .into_iter()
            .map(|c| Ok(RawEvent::sse("message", serde_json::to_string(&c).unwrap())))
            .collect();
        Box::pin(futures_util::stream::iter(events))
    }

    #[tokio::test]
    async fn exchange_decodes_forwards_and_commits_metadata() {
        let chunks = vec![
            Chunk::content("hello"),
            Chunk::usage(&Usage::new(4, 2)),
            Chunk::finish_reason("stop"),
            Chunk::terminal(),
        ];
        let mut handle = spawn_exchange(
            raw_stream(chunks),
            JsonChunkDecoder,
            ModelId::custom("test", "m"),
            vec![],
            ExchangeOptions::default(),
        );

        // Metadata resolves without draining the stream.
        assert_eq!(handle.usage().await, Some(Usage::new(4, 2)));
        assert_eq!(handle.finish_reason().await, Some(FinishReason::Stop));

        let result = handle.to_result().await.unwrap();
        assert_eq!(result.text(), "hello");
        assert_eq!(result.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn malformed_events_are_absorbed_silently() {
        let events: Vec<Result<RawEvent, LlmError>> = vec![
            Ok(RawEvent::sse("message", "not json at all")),
            Ok(RawEvent::sse(
                "message",
                serde_json::to_string(&Chunk::content("ok")).unwrap(),
            )),
            Ok(RawEvent::frame(&b"\x00\x01"[..])),
        ];
        let mut handle = spawn_exchange(
            Box::pin(futures_util::stream::iter(events)),
            JsonChunkDecoder,
            ModelId::custom("test", "m"),
            vec![],
            ExchangeOptions::default(),
        );
        assert_eq!(handle.collect_text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn metadata_resolves_while_consumer_lags_behind_a_small_channel() {
        let mut chunks: Vec<Chunk> = (0..100).map(|i| Chunk::content(format!("c{i};"))).collect();
        chunks.push(Chunk::usage(&Usage::new(10, 20)));
        chunks.push(Chunk::terminal());
        let mut handle = spawn_exchange(
            raw_stream(chunks),
            JsonChunkDecoder,
            ModelId::custom("test", "m"),
            vec![],
            ExchangeOptions {
                metadata_timeout: Duration::from_millis(500),
                channel_capacity: 4,
            },
        );

        // Far more chunks than the channel holds, nothing drained yet.
        assert_eq!(handle.usage().await, Some(Usage::new(10, 20)));

        // Every chunk is still delivered, in order.
        let text = handle.collect_text().await.unwrap();
        assert!(text.starts_with("c0;c1;"));
        assert!(text.ends_with("c99;"));
    }

    #[tokio::test]
    async fn metadata_commits_before_error_forwarding_waits_on_the_consumer() {
        let events: Vec<Result<RawEvent, LlmError>> = vec![
            Ok(RawEvent::sse(
                "message",
                serde_json::to_string(&Chunk::content("a")).unwrap(),
            )),
            Ok(RawEvent::sse(
                "message",
                serde_json::to_string(&Chunk::usage(&Usage::new(1, 1))).unwrap(),
            )),
            Err(LlmError::StreamError("reset".to_string())),
        ];
        let handle = spawn_exchange(
            Box::pin(futures_util::stream::iter(events)),
            JsonChunkDecoder,
            ModelId::custom("test", "m"),
            vec![],
            ExchangeOptions {
                metadata_timeout: Duration::from_millis(500),
                channel_capacity: 1,
            },
        );
        // The channel is full after the first chunk and the consumer never
        // drains; the usage observed before the failure still resolves.
        assert_eq!(handle.usage().await, Some(Usage::new(1, 1)));
    }

    #[tokio::test]
    async fn transport_error_is_forwarded_and_metadata_still_resolves() {
        let events: Vec<Result<RawEvent, LlmError>> = vec![
            Ok(RawEvent::sse(
                "message",
                serde_json::to_string(&Chunk::content("partial")).unwrap(),
            )),
            Err(LlmError::StreamError("reset".to_string())),
        ];
        let mut handle = spawn_exchange(
            Box::pin(futures_util::stream::iter(events)),
            JsonChunkDecoder,
            ModelId::custom("test", "m"),
            vec![],
            ExchangeOptions {
                metadata_timeout: Duration::from_millis(500),
                ..Default::default()
            },
        );
        let err = handle.to_result().await.err().expect("must fail");
        assert!(matches!(err, LlmError::StreamError(_)));
        // Degraded metadata, but no hang.
        assert_eq!(handle.usage().await, None);
    }
}
