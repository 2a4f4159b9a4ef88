//! Intent request and response types
//!
//! Request body for `POST /profiles/{id}/intent` and the planned bundle the
//! backend returns for it.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::operation::UnsignedOperations;
use super::u256_dec;

/// Kind of user action an intent expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Transfer,
    Swap,
    Bridge,
    AppInteraction,
}

/// Token, chain, and amount being spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSource {
    pub token: String,
    pub chain_id: u64,
    /// Contract address; absent for the native token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    /// Amount in atomic units
    #[serde(with = "u256_dec")]
    pub amount: U256,
}

/// Where value ends up: a recipient for transfers, a token/chain for swaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDestination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// Normalized request understood by the abstraction service.
///
/// Built fresh per user action and never mutated after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    pub source: IntentSource,
    pub destination: IntentDestination,
    /// Explicit gas token override; the backend chooses when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// One side of a transaction summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLeg {
    pub token: String,
    pub chain_id: u64,
    pub chain_name: String,
    /// Display amount, human units
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Human-readable summary for the confirmation screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub from: SummaryLeg,
    pub to: SummaryLeg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Estimated network fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Fee in atomic units of `token`
    #[serde(with = "u256_dec")]
    pub amount: U256,
    #[serde(default)]
    pub usd_value: f64,
}

/// Planned operation bundle for an intent.
///
/// `operation_set_id` must be used verbatim for submission and every status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub intent_id: String,
    pub operation_set_id: String,
    /// Estimated seconds until completion
    #[serde(default)]
    pub estimated_completion_time: u64,
    pub unsigned_operations: UnsignedOperations,
    pub summary: TransactionSummary,
    pub gas_estimate: GasEstimate,
}

impl IntentResponse {
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.unsigned_operations.is_expired_at(now)
    }
}
