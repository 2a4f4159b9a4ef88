//! Operation types
//!
//! Unsigned operations planned by the backend, the signatures collected for
//! them, and the status reported while they settle on-chain.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};

use super::u256_dec;

/// Transaction envelope type of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Legacy,
    Eip1559,
    Eip2930,
}

/// Optional gas parameters; values are decimal strings in wei-like units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
}

/// A chain-specific operation awaiting a signature.
///
/// `index` is the signing order: later operations on the same chain may depend
/// on nonce or state established by earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedOperation {
    pub index: u32,
    pub chain_id: u64,
    pub from: String,
    pub to: String,
    #[serde(with = "u256_dec")]
    pub value: U256,
    /// Hex-encoded call data (`0x`-prefixed)
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<GasParams>,
    #[serde(rename = "type")]
    pub tx_type: TxType,
}

impl UnsignedOperation {
    /// Decodes the call data into the bytes that get signed.
    pub fn call_data_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        let stripped = self.data.strip_prefix("0x").unwrap_or(&self.data);
        hex::decode(stripped)
    }
}

/// Ordered bundle of unsigned operations with an expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedOperations {
    pub operations: Vec<UnsignedOperation>,
    /// Unix timestamp (seconds) after which the bundle must not be signed or submitted
    pub expires_at: u64,
}

impl UnsignedOperations {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Signature collected for one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOperation {
    /// Matches the `index` of the signed `UnsignedOperation`
    pub index: u32,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_typed_data: Option<serde_json::Value>,
}

/// Request body for `POST /operations/{id}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSignedOperationsRequest {
    pub signed_operations: Vec<SignedOperation>,
}

/// Overall state of an operation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Pending,
    Processing,
    Successful,
    Failed,
    /// Some chains succeeded and others failed
    Partial,
}

impl OperationState {
    /// Definite outcomes. `Partial` is handled by the tracker's partial-status policy.
    pub fn is_final(self) -> bool {
        matches!(self, OperationState::Successful | OperationState::Failed)
    }
}

/// Per-chain transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainTxState {
    Pending,
    Confirmed,
    Failed,
}

/// Status of the transaction submitted on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
    pub status: ChainTxState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /operations/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub operation_set_id: String,
    pub status: OperationState,
    #[serde(default)]
    pub transactions: Vec<TransactionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl OperationStatus {
    /// Chains whose transaction failed; non-empty for `partial` and `failed` sets.
    pub fn failed_chains(&self) -> Vec<u64> {
        self.transactions
            .iter()
            .filter(|t| t.status == ChainTxState::Failed)
            .map(|t| t.chain_id)
            .collect()
    }
}
