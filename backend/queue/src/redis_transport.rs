//! Redis-backed transport: `RPUSH`/`BLPOP` lists and `PUBLISH`/`SUBSCRIBE`.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{Connection, MultiplexedConnection};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::transport::{QueueTransport, Subscription};

/// Smallest non-zero `BLPOP` timeout sent to the server, in seconds.
/// Anything that would round to zero would otherwise block forever.
const MIN_BLOCK_SECS: f64 = 0.01;

const SUBSCRIPTION_BUFFER: usize = 16;

/// Idle blocking connections kept for reuse.
const MAX_IDLE_BLOCKING: usize = 16;

/// Transport over a Redis server.
///
/// Pushes and publishes share one multiplexed connection. Blocking pops and
/// subscriptions need a connection of their own so they cannot stall the
/// shared one; blocking connections go back to an idle pool after each pop,
/// so a poll loop or consumer keeps reusing the same socket.
pub struct RedisTransport {
    client: redis::Client,
    shared: MultiplexedConnection,
    idle: Mutex<Vec<Connection>>,
}

impl RedisTransport {
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let shared = client.get_multiplexed_async_connection().await?;
        info!("Connected to redis");
        Ok(Self {
            client,
            shared,
            idle: Mutex::new(Vec::new()),
        })
    }

    async fn blocking_connection(&self) -> Result<Connection, QueueError> {
        if let Some(conn) = self.idle.lock().await.pop() {
            return Ok(conn);
        }
        debug!("opening blocking connection");
        Ok(self.client.get_async_connection().await?)
    }

    /// Only connections whose last command completed may go back to the pool.
    /// A pop cancelled mid-flight drops its connection instead.
    async fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock().await;
        if idle.len() < MAX_IDLE_BLOCKING {
            idle.push(conn);
        }
    }
}

#[async_trait]
impl QueueTransport for RedisTransport {
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        let mut conn = self.shared.clone();
        redis::cmd("RPUSH")
            .arg(queue)
            .arg(payload)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(queue, "pushed");
        Ok(())
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        let secs = if timeout.is_zero() {
            0.0
        } else {
            timeout.as_secs_f64().max(MIN_BLOCK_SECS)
        };
        let mut conn = self.blocking_connection().await?;
        let popped: Option<(String, Vec<u8>)> = redis::cmd("BLPOP")
            .arg(queue)
            .arg(secs)
            .query_async(&mut conn)
            .await?;
        self.release(conn).await;
        Ok(popped.map(|(_, payload)| payload))
    }

    async fn discard(&self, queue: &str) -> Result<(), QueueError> {
        let mut conn = self.shared.clone();
        redis::cmd("DEL").arg(queue).query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        let mut conn = self.shared.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!(channel, receivers, "published");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, QueueError> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(channel).await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let name = channel.to_string();
        let task = tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            loop {
                let Some(msg) = messages.next().await else {
                    warn!(channel = %name, "pub/sub stream ended");
                    break;
                };
                if tx.send(msg.get_payload_bytes().to_vec()).await.is_err() {
                    break;
                }
            }
        });
        debug!(channel, "subscribed");
        Ok(Subscription::new(channel, rx, task))
    }
}
