use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::QueueError;

/// Lists and pub/sub channels on the shared queue substrate.
///
/// Lists are FIFO: `push` appends, `blocking_pop` takes from the head.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Append a payload to the tail of `queue`.
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError>;

    /// Pop the head of `queue`, waiting up to `timeout`.
    ///
    /// `Duration::ZERO` waits indefinitely. Returns `None` on timeout.
    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError>;

    /// Delete `queue` and anything still in it.
    async fn discard(&self, queue: &str) -> Result<(), QueueError>;

    /// Fire-and-forget publish; dropped when nobody is subscribed.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), QueueError>;

    /// Subscribe to `channel`. Messages published after this returns are delivered.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, QueueError>;
}

/// A live pub/sub subscription.
///
/// Messages are forwarded by a background task; [`Subscription::unsubscribe`]
/// stops it and waits until the underlying listener is gone. Dropping the
/// subscription also stops the task, without waiting.
pub struct Subscription {
    channel: String,
    rx: mpsc::Receiver<Vec<u8>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(channel: impl Into<String>, rx: mpsc::Receiver<Vec<u8>>, task: JoinHandle<()>) -> Self {
        Self {
            channel: channel.into(),
            rx,
            task: Some(task),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next message, or `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        self.rx.close();
        debug!(channel = %self.channel, "unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
