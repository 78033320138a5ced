pub mod codes;
pub mod error;
pub mod event;
pub mod message;
pub mod traits;
pub mod types;

pub use codes::ErrorCode;
pub use error::{BridgeError, WalletError};
pub use event::StatusEvent;
pub use message::{Inbound, WalletEvent};
pub use traits::{Component, WalletSession};
pub use types::{
    ApprovedSession, JsonRpcError, JsonRpcResponse, Metadata, PairingRequest, PendingBinding,
    ProposalNamespace, Proposer, RpcRequest, SessionContext, SessionNamespace, SessionProposal,
    SessionRequest, SessionRequestParams,
};
