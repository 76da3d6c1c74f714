//! Cancellation utilities
//!
//! First-class cancellation handles for chunk streams. Cancellation is
//! race-free: it may be invoked concurrently with an in-progress drain, and
//! a pending pull terminates promptly instead of blocking indefinitely.

use tokio_util::sync::CancellationToken;

use super::facade::ChunkStream;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a standalone cancel handle that can be shared across tasks.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Any wrapped streams and the exchange task
    /// observing this handle stop as soon as possible. Safe to call after
    /// natural completion (no-op) and safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Make a chunk stream cancellable and return its cancel handle.
///
/// For callers wiring their own transport into
/// [`StreamHandle::from_parts`](super::facade::StreamHandle::from_parts);
/// streams built by [`spawn_exchange`](super::factory::spawn_exchange) are
/// already cancellable.
pub fn make_cancellable_stream(stream: ChunkStream) -> (ChunkStream, CancelHandle) {
    let handle = CancelHandle::new();
    let token = handle.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures_util::StreamExt;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    (Box::pin(s), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn cancel_wakes_pending_next_immediately() {
        // A stream that never yields and never ends.
        let pending: ChunkStream = Box::pin(futures_util::stream::pending());
        let (mut s, cancel) = make_cancellable_stream(pending);

        let waiter = tokio::spawn(async move { s.next().await });

        // Give the task a chance to poll and block on `next()`.
        tokio::task::yield_now().await;

        cancel.cancel();

        let out = tokio::time::timeout(std::time::Duration::from_millis(200), waiter)
            .await
            .expect("cancel should wake the waiting task")
            .expect("task ok");

        assert!(out.is_none());
    }

    #[tokio::test]
    async fn uncancelled_stream_passes_items_through() {
        let items = vec![Ok(Chunk::content("a")), Ok(Chunk::content("b"))];
        let inner: ChunkStream = Box::pin(futures_util::stream::iter(items));
        let (mut s, _cancel) = make_cancellable_stream(inner);

        let mut seen = Vec::new();
        while let Some(item) = s.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![Chunk::content("a"), Chunk::content("b")]);
    }
}
