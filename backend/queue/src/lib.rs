//! `signbridge-queue` — the queue substrate as the bridge sees it.
//!
//! Provides:
//! - [`QueueTransport`]: list push / blocking pop plus pub/sub
//! - [`RedisTransport`] for production and [`MemoryTransport`] for tests and local runs
//! - [`CorrelatedRpc`]: publish a request, race pub/sub and list polling for the reply

pub mod envelope;
pub mod error;
pub mod memory;
pub mod redis_transport;
pub mod rpc;
pub mod ticket;
pub mod transport;

pub use envelope::{event_envelope, request_envelope};
pub use error::{QueueError, RpcError};
pub use memory::MemoryTransport;
pub use redis_transport::RedisTransport;
pub use rpc::{CorrelatedRpc, MAX_POLL_TICK};
pub use ticket::{reply_channel_for, CorrelationTicket};
pub use transport::{QueueTransport, Subscription};
