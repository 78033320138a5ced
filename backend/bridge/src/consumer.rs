//! Inbound pairing-request consumer.

use std::sync::Arc;
use std::time::Duration;

use signbridge_queue::QueueTransport;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::orchestrator::Orchestrator;

/// Pops pairing requests one at a time and hands each to the orchestrator
/// before taking the next, so bindings are queued in arrival order.
pub struct PairingConsumer {
    transport: Arc<dyn QueueTransport>,
    queue: String,
    backoff: Duration,
    orchestrator: Arc<Orchestrator>,
}

impl PairingConsumer {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        queue: impl Into<String>,
        backoff: Duration,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            transport,
            queue: queue.into(),
            backoff,
            orchestrator,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = %self.queue, "Pairing consumer started");
        while let Some(bytes) =
            next_item(self.transport.as_ref(), &self.queue, self.backoff, &mut shutdown).await
        {
            self.orchestrator.on_pairing_request(&bytes).await;
        }
        info!(queue = %self.queue, "Pairing consumer stopped");
    }
}

/// Wait indefinitely for the next item on `queue`.
///
/// Transport errors are logged and retried after `backoff`. Returns `None`
/// once shutdown is signalled.
pub(crate) async fn next_item(
    transport: &dyn QueueTransport,
    queue: &str,
    backoff: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<Vec<u8>> {
    loop {
        if *shutdown.borrow() {
            return None;
        }
        tokio::select! {
            _ = shutdown.changed() => return None,
            popped = transport.blocking_pop(queue, Duration::ZERO) => match popped {
                Ok(Some(bytes)) => return Some(bytes),
                Ok(None) => {}
                Err(e) => {
                    warn!(queue, error = %e, backoff_ms = backoff.as_millis() as u64, "queue pop failed");
                    tokio::select! {
                        _ = shutdown.changed() => return None,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            },
        }
    }
}
