//! Wallet service modules
//!
//! Submission and status tracking, and the pipeline that chains intent
//! creation, signing, submission, and tracking together.

pub mod pipeline;
pub mod tracker;

// Re-export for convenience
pub use pipeline::{TransactionOutcome, TransactionPipeline};
pub use tracker::{PollOptions, StatusCallback, StatusTracker};
