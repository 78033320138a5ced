//! In-process transport with the same list and pub/sub semantics as Redis.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, Notify, broadcast, mpsc};
use tracing::trace;

use crate::error::QueueError;
use crate::transport::{QueueTransport, Subscription};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    lists: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
    pushed: Notify,
}

/// Shared in-memory queue substrate. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items waiting in `queue`.
    pub async fn len(&self, queue: &str) -> usize {
        self.inner.lists.lock().await.get(queue).map_or(0, VecDeque::len)
    }

    /// Pop without waiting.
    pub async fn try_pop(&self, queue: &str) -> Option<Vec<u8>> {
        self.inner.lists.lock().await.get_mut(queue)?.pop_front()
    }

    /// Number of live subscriptions on `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .await
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

#[async_trait]
impl QueueTransport for MemoryTransport {
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        self.inner
            .lists
            .lock()
            .await
            .entry(queue.to_string())
            .or_default()
            .push_back(payload);
        self.inner.pushed.notify_waiters();
        trace!(queue, "pushed");
        Ok(())
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking so a push in between is not missed.
            let notified = self.inner.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_pop(queue).await {
                return Ok(Some(item));
            }

            if timeout.is_zero() {
                notified.await;
            } else if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn discard(&self, queue: &str) -> Result<(), QueueError> {
        self.inner.lists.lock().await.remove(queue);
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        if let Some(tx) = self.inner.channels.lock().await.get(channel) {
            // No receivers is not an error for pub/sub.
            let _ = tx.send(payload);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, QueueError> {
        let mut source = self
            .inner
            .channels
            .lock()
            .await
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(channel, rx, task))
    }
}
