//! Balance types
//!
//! Raw per-chain entries as returned by `GET /profiles/{id}/balance`, and the
//! unified per-token view built from them.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};

use super::u256_dec;

// ============================================================================
// BACKEND PAYLOAD
// ============================================================================

/// Balance payload returned by the backend before aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePayload {
    /// One entry per (token, chain) holding
    #[serde(default)]
    pub balances: Vec<RawChainBalance>,
    /// Gas-payment candidates scored by the backend
    #[serde(default)]
    pub gas_tokens: Vec<GasTokenCandidate>,
}

/// A single token holding on a single chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChainBalance {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub chain_id: u64,
    pub chain_name: String,
    /// Raw integer amount in atomic units
    #[serde(with = "u256_dec")]
    pub amount: U256,
    #[serde(default)]
    pub usd_value: f64,
    /// Token contract address; absent for the native token
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub is_native: bool,
}

/// Backend-scored token that could pay for gas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasTokenCandidate {
    pub symbol: String,
    pub chain_id: u64,
    /// Suitability score (0-100)
    pub score: u8,
    #[serde(default)]
    pub estimated_cost_usd: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

// ============================================================================
// UNIFIED VIEW
// ============================================================================

/// Per-chain balance of a unified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBalance {
    pub chain_id: u64,
    pub chain_name: String,
    /// Precision of the token contract on this chain
    pub decimals: u8,
    #[serde(with = "u256_dec")]
    pub amount: U256,
    pub token_address: Option<String>,
    pub is_native: bool,
}

/// A token aggregated across every chain it is held on.
///
/// `decimals` is the highest precision among the chain balances, and
/// `total_amount` is the sum of `chain_balances[*].amount` rescaled to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedToken {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(with = "u256_dec")]
    pub total_amount: U256,
    pub total_usd_value: f64,
    pub chain_balances: Vec<ChainBalance>,
}

impl UnifiedToken {
    /// Default source chain for spending this token: the first chain balance.
    pub fn primary_chain(&self) -> Option<&ChainBalance> {
        self.chain_balances.first()
    }

    pub fn balance_on(&self, chain_id: u64) -> Option<&ChainBalance> {
        self.chain_balances.iter().find(|b| b.chain_id == chain_id)
    }
}

/// Suggested token for paying network fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasTokenSuggestion {
    pub symbol: String,
    pub chain_id: u64,
    /// Suitability score (0-100)
    pub score: u8,
    pub estimated_cost_usd: f64,
}

/// Native gas balance on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeGasBalance {
    pub chain_id: u64,
    pub chain_name: String,
    pub symbol: String,
    #[serde(with = "u256_dec")]
    pub amount: U256,
    /// Whether the balance covers one average transaction
    pub has_enough_gas: bool,
}

/// Alternative (non-native) gas token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeGasToken {
    pub symbol: String,
    pub chain_id: u64,
    pub score: u8,
    pub estimated_cost_usd: f64,
    pub available: bool,
}

/// Gas-payment analysis for a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAnalysis {
    /// Highest-scoring usable token; `None` when nothing can pay for gas
    pub suggested_gas_token: Option<GasTokenSuggestion>,
    pub native_gas_balances: Vec<NativeGasBalance>,
    pub alternative_gas_tokens: Option<Vec<AlternativeGasToken>>,
}

impl GasAnalysis {
    /// True if at least one chain holds enough native gas for an average transaction.
    pub fn has_native_gas(&self) -> bool {
        self.native_gas_balances.iter().any(|b| b.has_enough_gas)
    }
}

/// Aggregated balance of a profile across chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedBalance {
    pub total_usd_value: f64,
    pub tokens: Vec<UnifiedToken>,
    pub gas_analysis: GasAnalysis,
}

impl UnifiedBalance {
    pub fn token(&self, symbol: &str) -> Option<&UnifiedToken> {
        self.tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }
}
