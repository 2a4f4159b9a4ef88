//! Cryptographic operations for the session wallet
//!
//! This module provides operation digests and local key signing.

pub mod hash;
pub mod signing;

// Re-export for convenience
pub use hash::operation_digest;
pub use signing::LocalKeySigner;
