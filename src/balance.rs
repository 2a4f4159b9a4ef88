//! Balance Aggregator
//!
//! Normalizes the backend's per-chain balance entries into a per-token view
//! and ranks candidate gas-payment tokens.
//!
//! Flow:
//! 1. Fetch raw per-chain balances for a profile.
//! 2. Group entries by token symbol, summing amounts and USD values. A symbol
//!    deployed with different decimals on different chains is summed at the
//!    highest precision; each chain balance keeps its own decimals.
//! 3. Check each chain's native balance against the configured threshold.
//! 4. If no chain has enough native gas, rank the backend's alternative gas
//!    tokens by suitability score and pick the highest.

use ethereum_types::U256;
use tracing::{debug, info};

use crate::api_client::IntentServiceClient;
use crate::config::GasConfig;
use crate::error::{Result, WalletError};
use crate::types::{
    AlternativeGasToken, BalancePayload, ChainBalance, GasAnalysis, GasTokenCandidate,
    GasTokenSuggestion, NativeGasBalance, RawChainBalance, UnifiedBalance, UnifiedToken,
};

/// Score given to a sufficient native balance the backend did not score.
pub const DEFAULT_NATIVE_GAS_SCORE: u8 = 100;

/// Highest valid suitability score.
pub const MAX_GAS_SCORE: u8 = 100;

/// Fetches and aggregates profile balances.
pub struct BalanceAggregator {
    client: IntentServiceClient,
    gas_config: GasConfig,
}

impl BalanceAggregator {
    pub fn new(client: IntentServiceClient, gas_config: GasConfig) -> Self {
        Self { client, gas_config }
    }

    /// Fetch and aggregate the unified balance of a profile.
    ///
    /// Errors propagate unchanged; a failed fetch never yields a partial aggregate.
    pub async fn get_unified_balance(&self, profile_id: &str) -> Result<UnifiedBalance> {
        let payload = self.client.get_balance(profile_id).await?;
        let unified = aggregate_balances(&payload, &self.gas_config)?;
        info!(
            "Aggregated {} token(s) for profile {} (total ${:.2})",
            unified.tokens.len(),
            profile_id,
            unified.total_usd_value
        );
        Ok(unified)
    }
}

/// Aggregate raw per-chain balances into a [`UnifiedBalance`].
///
/// Tokens are grouped by symbol (case-insensitive) and ordered by aggregate
/// USD value, highest first; ties keep first-appearance order. Chain balances
/// keep the order in which the backend listed them.
pub fn aggregate_balances(payload: &BalancePayload, gas_config: &GasConfig) -> Result<UnifiedBalance> {
    let mut tokens: Vec<UnifiedToken> = Vec::new();

    for entry in &payload.balances {
        let position = tokens
            .iter()
            .position(|t| t.symbol.eq_ignore_ascii_case(&entry.symbol));

        let token = match position {
            Some(i) => &mut tokens[i],
            None => {
                tokens.push(UnifiedToken {
                    symbol: entry.symbol.clone(),
                    name: entry.name.clone(),
                    decimals: entry.decimals,
                    total_amount: U256::zero(),
                    total_usd_value: 0.0,
                    chain_balances: Vec::new(),
                });
                let last = tokens.len() - 1;
                &mut tokens[last]
            }
        };

        if entry.decimals > token.decimals {
            debug!(
                "Token {} has {} decimals on chain {}, rescaling total from {}",
                entry.symbol, entry.decimals, entry.chain_id, token.decimals
            );
            token.total_amount = rescale(token.total_amount, token.decimals, entry.decimals, &entry.symbol)?;
            token.decimals = entry.decimals;
        }

        let scaled = rescale(entry.amount, entry.decimals, token.decimals, &entry.symbol)?;
        token.total_amount = token.total_amount.checked_add(scaled).ok_or_else(|| {
            WalletError::InvalidResponse(format!("Total amount of {} overflows", entry.symbol))
        })?;
        token.total_usd_value += entry.usd_value;
        token.chain_balances.push(ChainBalance {
            chain_id: entry.chain_id,
            chain_name: entry.chain_name.clone(),
            decimals: entry.decimals,
            amount: entry.amount,
            token_address: entry.token_address.clone(),
            is_native: entry.is_native,
        });
    }

    // Stable sort keeps first-appearance order for equal values.
    tokens.sort_by(|a, b| {
        b.total_usd_value
            .partial_cmp(&a.total_usd_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_usd_value: f64 = tokens.iter().map(|t| t.total_usd_value).sum();
    let gas_analysis = analyze_gas(&payload.balances, &payload.gas_tokens, gas_config);

    Ok(UnifiedBalance {
        total_usd_value,
        tokens,
        gas_analysis,
    })
}

/// Express `amount` (at `from` decimals) at `to` decimals, `to >= from`.
fn rescale(amount: U256, from: u8, to: u8, symbol: &str) -> Result<U256> {
    let factor = U256::from(10u64)
        .checked_pow(U256::from(to - from))
        .ok_or_else(|| WalletError::InvalidResponse(format!("Decimals of {} out of range", symbol)))?;
    amount
        .checked_mul(factor)
        .ok_or_else(|| WalletError::InvalidResponse(format!("Total amount of {} overflows", symbol)))
}

/// Build the gas analysis for a set of raw balances.
///
/// The suggestion is always the highest-scoring entry among the tokens
/// considered: sufficient native balances when any exist, otherwise the
/// available alternatives.
pub fn analyze_gas(
    balances: &[RawChainBalance],
    candidates: &[GasTokenCandidate],
    gas_config: &GasConfig,
) -> GasAnalysis {
    let native_gas_balances: Vec<NativeGasBalance> = balances
        .iter()
        .filter(|b| b.is_native)
        .map(|b| NativeGasBalance {
            chain_id: b.chain_id,
            chain_name: b.chain_name.clone(),
            symbol: b.symbol.clone(),
            amount: b.amount,
            has_enough_gas: b.amount >= gas_config.native_threshold_for(b.chain_id),
        })
        .collect();

    let find_candidate = |symbol: &str, chain_id: u64| {
        candidates
            .iter()
            .find(|c| c.chain_id == chain_id && c.symbol.eq_ignore_ascii_case(symbol))
    };

    let alternatives: Vec<AlternativeGasToken> = candidates
        .iter()
        .filter(|c| {
            !native_gas_balances
                .iter()
                .any(|n| n.chain_id == c.chain_id && n.symbol.eq_ignore_ascii_case(&c.symbol))
        })
        .map(|c| AlternativeGasToken {
            symbol: c.symbol.clone(),
            chain_id: c.chain_id,
            score: c.score.min(MAX_GAS_SCORE),
            estimated_cost_usd: c.estimated_cost_usd,
            available: c.available,
        })
        .collect();

    let considered: Vec<GasTokenSuggestion> = if native_gas_balances.iter().any(|n| n.has_enough_gas) {
        native_gas_balances
            .iter()
            .filter(|n| n.has_enough_gas)
            .map(|n| {
                let scored = find_candidate(&n.symbol, n.chain_id);
                GasTokenSuggestion {
                    symbol: n.symbol.clone(),
                    chain_id: n.chain_id,
                    score: scored
                        .map(|c| c.score.min(MAX_GAS_SCORE))
                        .unwrap_or(DEFAULT_NATIVE_GAS_SCORE),
                    estimated_cost_usd: scored.map(|c| c.estimated_cost_usd).unwrap_or(0.0),
                }
            })
            .collect()
    } else {
        debug!("No chain holds enough native gas, ranking {} alternative(s)", alternatives.len());
        alternatives
            .iter()
            .filter(|a| a.available)
            .map(|a| GasTokenSuggestion {
                symbol: a.symbol.clone(),
                chain_id: a.chain_id,
                score: a.score,
                estimated_cost_usd: a.estimated_cost_usd,
            })
            .collect()
    };

    GasAnalysis {
        suggested_gas_token: highest_score(considered),
        native_gas_balances,
        alternative_gas_tokens: if alternatives.is_empty() {
            None
        } else {
            Some(alternatives)
        },
    }
}

/// First entry with the maximum score.
fn highest_score(entries: Vec<GasTokenSuggestion>) -> Option<GasTokenSuggestion> {
    let mut best: Option<GasTokenSuggestion> = None;
    for entry in entries {
        match &best {
            Some(current) if current.score >= entry.score => {}
            _ => best = Some(entry),
        }
    }
    best
}
