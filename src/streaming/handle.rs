//! Metadata Handle
//!
//! Metadata for an exchange (usage, finish reason, backend extras) is often
//! delivered only in a final frame, so it is collected by a task that runs
//! independently of however fast the consumer drains the chunk sequence. The
//! handle is multi-reader and may be awaited any number of times; the sink is
//! single-writer and commits exactly once. If the producer dies without
//! committing, readers resolve to a degraded record instead of hanging.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::types::{meta_keys, Chunk, FinishReason, MetadataRecord, ProviderMetadata, Usage};

/// Create a linked sink/handle pair. `timeout` bounds every await on the
/// handle; exceeding it resolves to a degraded record.
pub fn metadata_channel(timeout: Duration) -> (MetadataSink, MetadataHandle) {
    let (tx, rx) = watch::channel(None);
    (MetadataSink { tx }, MetadataHandle { rx, timeout })
}

/// Write side. Commit consumes the sink, so a second commit cannot compile.
#[derive(Debug)]
pub struct MetadataSink {
    tx: watch::Sender<Option<MetadataRecord>>,
}

impl MetadataSink {
    /// Commit the final record, waking every current and future awaiter.
    pub fn commit(self, record: MetadataRecord) {
        // Send only fails when no receiver is left, which is fine: there is
        // nobody to wake.
        let _ = self.tx.send(Some(record));
    }
}

/// Read side. Cloneable; every clone awaits the same record.
#[derive(Debug, Clone)]
pub struct MetadataHandle {
    rx: watch::Receiver<Option<MetadataRecord>>,
    timeout: Duration,
}

impl MetadataHandle {
    /// Await the committed record.
    ///
    /// Blocks until the producer commits, then returns the same record on
    /// every subsequent call. Resolves to [`MetadataRecord::degraded`] when
    /// the producer is dropped uncommitted or the configured timeout elapses;
    /// this call never hangs and never errors.
    pub async fn recv(&self) -> MetadataRecord {
        let mut rx = self.rx.clone();
        let wait = async move {
            loop {
                if let Some(record) = rx.borrow_and_update().as_ref() {
                    return record.clone();
                }
                if rx.changed().await.is_err() {
                    // Producer dropped. A commit may have raced the drop.
                    return match rx.borrow().as_ref() {
                        Some(record) => record.clone(),
                        None => {
                            tracing::debug!("metadata producer dropped uncommitted; degrading");
                            MetadataRecord::degraded()
                        }
                    };
                }
            }
        };
        match tokio::time::timeout(self.timeout, wait).await {
            Ok(record) => record,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "metadata await timed out; degrading"
                );
                MetadataRecord::degraded()
            }
        }
    }
}

/// Folds the `Meta` signals observed on a chunk stream into the final
/// [`MetadataRecord`]. Usage snapshots merge field-wise, later reports
/// superseding earlier ones; typed
/// backend fields are lifted into their extension records and everything else
/// passes through as opaque extras.
#[derive(Debug, Default)]
pub struct MetadataCollector {
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
    provider: ProviderMetadata,
    terminal_seen: bool,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one chunk in arrival order.
    pub fn observe(&mut self, chunk: &Chunk) {
        if chunk.is_terminal() {
            self.terminal_seen = true;
        }
        if let Some(usage) = chunk.meta_usage() {
            match &mut self.usage {
                Some(existing) => existing.merge(&usage),
                None => self.usage = Some(usage),
            }
        }
        if let Some(reason) = chunk.meta_finish_reason() {
            self.finish_reason = Some(reason);
        }
        if let Chunk::Meta { fields } = chunk {
            self.collect_provider_fields(fields);
        }
    }

    fn collect_provider_fields(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                // Keys the core interprets directly.
                meta_keys::TERMINAL
                | meta_keys::FINISH_REASON
                | meta_keys::USAGE
                | meta_keys::TOOL_CALL_FRAGMENT => {}
                meta_keys::RESPONSE_ID => {
                    if let Some(id) = value.as_str() {
                        self.provider.openai_mut().response_id = Some(id.to_string());
                    }
                }
                meta_keys::SYSTEM_FINGERPRINT => {
                    if let Some(fp) = value.as_str() {
                        self.provider.openai_mut().system_fingerprint = Some(fp.to_string());
                    }
                }
                meta_keys::CACHE_READ_INPUT_TOKENS => {
                    if let Some(n) = value.as_u64() {
                        self.provider.anthropic_mut().cache_read_input_tokens = Some(n as u32);
                    }
                }
                meta_keys::STOP_SEQUENCE => {
                    if let Some(seq) = value.as_str() {
                        self.provider.anthropic_mut().stop_sequence = Some(seq.to_string());
                    }
                }
                meta_keys::SAFETY_BLOCKED => {
                    if let Some(blocked) = value.as_bool() {
                        self.provider.gemini_mut().safety_blocked = Some(blocked);
                    }
                }
                _ => {
                    self.provider.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Whether the terminal marker has been observed.
    pub fn terminal_seen(&self) -> bool {
        self.terminal_seen
    }

    /// Consume the collector into the record to commit.
    pub fn finish(self) -> MetadataRecord {
        MetadataRecord {
            usage: self.usage,
            finish_reason: self.finish_reason,
            provider: self.provider,
        }
    }
}
