//! Fixed protocol error codes sent back to the dApp side.
//!
//! Proposal rejections use the wallet-session SDK codes; request responses use
//! JSON-RPC codes, except for backend rejections which reuse `USER_REJECTED`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: i64,
    pub message: &'static str,
}

/// Proposal does not offer the configured network.
pub const UNSUPPORTED_CHAINS: ErrorCode = ErrorCode {
    code: 5100,
    message: "Unsupported chains.",
};

/// Proposal could not be matched to an address, or the backend refused to sign.
pub const USER_REJECTED: ErrorCode = ErrorCode {
    code: 5000,
    message: "User rejected.",
};

pub const INVALID_PARAMS: ErrorCode = ErrorCode {
    code: -32602,
    message: "Invalid params",
};

/// Signing timed out or the handler failed unexpectedly.
pub const INTERNAL_ERROR: ErrorCode = ErrorCode {
    code: -32603,
    message: "Internal error",
};
