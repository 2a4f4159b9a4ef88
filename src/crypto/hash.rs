//! Operation digest calculation

use sha3::{Digest, Keccak256};

use crate::error::{Result, WalletError};
use crate::types::UnsignedOperation;

/// Keccak-256 digest a key manager signs for one operation.
///
/// Covers the signing position, chain, sender, target, value, and call data,
/// so a signature cannot be replayed for a different operation in the bundle.
pub fn operation_digest(operation: &UnsignedOperation) -> Result<[u8; 32]> {
    let call_data = operation.call_data_bytes().map_err(|e| {
        WalletError::InvalidBundle(format!(
            "Operation {} has malformed call data: {}",
            operation.index, e
        ))
    })?;

    let mut value = [0u8; 32];
    operation.value.to_big_endian(&mut value);

    let mut hasher = Keccak256::new();
    hasher.update(operation.index.to_be_bytes());
    hasher.update(operation.chain_id.to_be_bytes());
    hasher.update(operation.from.to_lowercase().as_bytes());
    hasher.update(operation.to.to_lowercase().as_bytes());
    hasher.update(value);
    hasher.update(&call_data);
    Ok(hasher.finalize().into())
}
