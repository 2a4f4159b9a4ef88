//! Wallet core library for chain-abstracted transactions
//!
//! Provides balance aggregation, intent building, the signing request queue,
//! bundle signing, and submission/status tracking against the abstraction service.

pub mod api_client;
pub mod balance;
pub mod cancel;
pub mod config;
pub mod crypto;
pub mod error;
pub mod intent;
pub mod service;
pub mod signing;
pub mod types;

// Re-export public types for convenience
pub use api_client::IntentServiceClient;
pub use balance::{aggregate_balances, analyze_gas, BalanceAggregator};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{PartialStatusPolicy, SigningMode, WalletConfig};
pub use crypto::LocalKeySigner;
pub use error::{ApiError, Result, WalletError};
pub use intent::{format_units, parse_units, IntentBuilder};
pub use service::{PollOptions, StatusTracker, TransactionOutcome, TransactionPipeline};
pub use signing::{
    spawn_auto_approver, ApprovalDecision, KeyManager, OperationSigner, PendingRequest,
    RequestKind, SigningCapability, SigningRequestQueue, SigningResult,
};
