use thiserror::Error;

/// Top-level error type for the bridge's internal handler flows.
///
/// None of these escape a handler boundary: the orchestrator turns each one
/// into a status event or a protocol-level error response.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("wallet session error: {0}")]
    Wallet(#[from] WalletError),

    #[error("queue transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by a [`crate::WalletSession`] implementation.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("pairing failed: {0}")]
    Pairing(String),

    #[error("wallet session rejected the command: {0}")]
    Rejected(String),

    #[error("wallet session unavailable: {0}")]
    Unavailable(String),

    #[error("wallet session command timed out")]
    Timeout,
}
