use std::sync::Arc;

use signbridge_core::{BridgeError, StatusEvent};
use signbridge_queue::{QueueTransport, event_envelope};
use tracing::debug;
use uuid::Uuid;

/// Pushes status events onto the outbound status queue.
#[derive(Clone)]
pub struct StatusPublisher {
    transport: Arc<dyn QueueTransport>,
    queue: String,
}

impl StatusPublisher {
    pub fn new(transport: Arc<dyn QueueTransport>, queue: impl Into<String>) -> Self {
        Self {
            transport,
            queue: queue.into(),
        }
    }

    pub async fn publish(&self, event: &StatusEvent) -> Result<(), BridgeError> {
        let body = serde_json::to_value(event)?;
        let correlation_id = Uuid::new_v4().to_string();
        let envelope = event_envelope(&body, &correlation_id)
            .map_err(|e| BridgeError::MalformedPayload(e.to_string()))?;
        self.transport
            .push(&self.queue, envelope)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        debug!(status = event.kind(), queue = %self.queue, "status event published");
        Ok(())
    }
}
