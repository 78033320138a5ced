use std::time::Duration;

use signbridge_codec::EncodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("transport closed: {0}")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("no reply on {reply_channel} within {timeout:?}")]
    Timeout {
        correlation_id: String,
        reply_channel: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Transport(#[from] QueueError),

    #[error("failed to encode request: {0}")]
    Encode(#[from] EncodeError),

    #[error("request payload must be a JSON object")]
    NotAnObject,
}

impl RpcError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }
}
