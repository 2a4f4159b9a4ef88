//! Signing: the approval queue and the bundle signer built on it.

pub mod dev;
pub mod queue;
pub mod signer;

pub use dev::{spawn_auto_approver, ApprovalDecision};
pub use queue::{synthesize_result, PendingRequest, RequestId, RequestKind, SigningRequestQueue, SigningResult};
pub use signer::{KeyManager, OperationSigner, SigningCapability};
