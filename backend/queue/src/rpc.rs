//! Correlated request/reply over the queue substrate.
//!
//! The backend may answer through pub/sub or by pushing onto a list, depending
//! on its own framework. A call therefore listens on both at once:
//!
//! 1. Issue a ticket (correlation id, reply channel, deadline)
//! 2. Subscribe to the reply channel
//! 3. Push the request envelope onto the request queue
//! 4. Race the subscription against a loop of short blocking pops on the
//!    list of the same name; the first body that parses as JSON wins
//! 5. Release the subscription and delete the reply list, whatever the outcome

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use signbridge_codec::decode;
use tracing::{debug, warn};

use crate::envelope::request_envelope;
use crate::error::RpcError;
use crate::ticket::CorrelationTicket;
use crate::transport::{QueueTransport, Subscription};

/// Upper bound on a single blocking pop, so the loop re-checks the deadline.
pub const MAX_POLL_TICK: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct CorrelatedRpc {
    transport: Arc<dyn QueueTransport>,
    request_queue: String,
    reply_prefix: String,
    poll_tick: Duration,
}

impl CorrelatedRpc {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        request_queue: impl Into<String>,
        reply_prefix: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            request_queue: request_queue.into(),
            reply_prefix: reply_prefix.into(),
            poll_tick: MAX_POLL_TICK,
        }
    }

    /// Override the poll tick; values above [`MAX_POLL_TICK`] are capped.
    pub fn with_poll_tick(mut self, tick: Duration) -> Self {
        self.poll_tick = tick.min(MAX_POLL_TICK).max(Duration::from_millis(1));
        self
    }

    /// Send `payload` and wait for the correlated reply.
    ///
    /// `payload` must be a JSON object; `cid` and `replyTo` are added to it.
    /// The parsed reply is returned as-is, so `{"error": ...}` vs
    /// `{"result": ...}` is for the caller to interpret. On timeout the
    /// request stays queued.
    pub async fn call(&self, payload: Value, timeout: Duration) -> Result<Value, RpcError> {
        let Value::Object(mut body) = payload else {
            return Err(RpcError::NotAnObject);
        };

        let ticket = CorrelationTicket::issue(&self.reply_prefix, timeout);
        body.insert("cid".into(), ticket.correlation_id.clone().into());
        body.insert("replyTo".into(), ticket.reply_channel.clone().into());
        let envelope = request_envelope(
            &Value::Object(body),
            &ticket.correlation_id,
            &ticket.reply_channel,
        )?;

        let mut subscription = self.transport.subscribe(&ticket.reply_channel).await?;
        if let Err(e) = self.transport.push(&self.request_queue, envelope).await {
            subscription.unsubscribe().await;
            return Err(e.into());
        }
        debug!(
            correlation_id = %ticket.correlation_id,
            queue = %self.request_queue,
            "request pushed, awaiting reply"
        );

        let raced = tokio::time::timeout_at(ticket.deadline, async {
            tokio::select! {
                reply = listen(&mut subscription) => (reply, "subscribe"),
                reply = poll(self.transport.as_ref(), &ticket, self.poll_tick) => (reply, "poll"),
            }
        })
        .await;

        subscription.unsubscribe().await;
        // A reply that lost the race may still sit on the list.
        if let Err(e) = self.transport.discard(&ticket.reply_channel).await {
            warn!(list = %ticket.reply_channel, error = %e, "failed to delete reply list");
        }

        match raced {
            Ok((reply, path)) => {
                debug!(correlation_id = %ticket.correlation_id, path, "reply received");
                Ok(reply)
            }
            Err(_) => {
                warn!(
                    correlation_id = %ticket.correlation_id,
                    timeout_secs = timeout.as_secs(),
                    "no reply before deadline"
                );
                Err(RpcError::Timeout {
                    correlation_id: ticket.correlation_id,
                    reply_channel: ticket.reply_channel,
                    timeout,
                })
            }
        }
    }
}

fn parse_reply(bytes: &[u8]) -> Option<Value> {
    decode(bytes).json().ok()
}

/// Pub/sub path. Never completes if the subscription closes without a reply.
async fn listen(subscription: &mut Subscription) -> Value {
    while let Some(bytes) = subscription.recv().await {
        match parse_reply(&bytes) {
            Some(reply) => return reply,
            None => debug!(channel = subscription.channel(), "skipping unparseable reply"),
        }
    }
    std::future::pending().await
}

/// List path: blocking pops capped at `tick` until the deadline.
async fn poll(transport: &dyn QueueTransport, ticket: &CorrelationTicket, tick: Duration) -> Value {
    loop {
        let remaining = ticket.remaining();
        if remaining.is_zero() {
            return std::future::pending().await;
        }
        let wait = remaining.min(tick);
        match transport.blocking_pop(&ticket.reply_channel, wait).await {
            Ok(Some(bytes)) => match parse_reply(&bytes) {
                Some(reply) => return reply,
                None => debug!(list = %ticket.reply_channel, "skipping unparseable reply"),
            },
            Ok(None) => {}
            Err(e) => {
                warn!(list = %ticket.reply_channel, error = %e, "reply poll failed, retrying");
                tokio::time::sleep(wait).await;
            }
        }
    }
}
