//! Intent Builder
//!
//! Converts a high-level user action (transfer, swap, bridge of a specific
//! token and amount) into a [`TransactionIntent`] for the abstraction service.
//!
//! Human amounts are converted to atomic units by truncation: any fraction
//! below one atomic unit is dropped, never rounded up, so an intent never
//! moves more than the user entered.

use ethereum_types::U256;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::types::{IntentDestination, IntentSource, IntentType, TransactionIntent, UnifiedToken};

/// Convert a human-unit decimal string to atomic units, truncating extra precision.
///
/// `parse_units("1.2345", 2)` is `123`; `parse_units("0.001", 2)` is `0`.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(WalletError::InvalidAmount("amount is empty".to_string()));
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(WalletError::InvalidAmount(format!("'{}' is not a number", amount)));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(WalletError::InvalidAmount(format!(
            "'{}' must be a non-negative decimal number",
            amount
        )));
    }

    let decimals = decimals as usize;
    let kept_fraction: String = frac_part.chars().take(decimals).collect();
    let digits = format!("{}{:0<width$}", int_part, kept_fraction, width = decimals);
    let digits = digits.trim_start_matches('0');

    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits)
        .map_err(|_| WalletError::InvalidAmount(format!("'{}' exceeds the 256-bit range", amount)))
}

/// Render atomic units as a human-unit decimal string without trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Builder for a single [`TransactionIntent`].
///
/// Defaults the source chain to the token's first chain balance. That is a
/// simplification: the user cannot yet split a spend across chains.
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    intent_type: IntentType,
    token: UnifiedToken,
    amount: String,
    source_chain_id: Option<u64>,
    destination: IntentDestination,
    gas_token: Option<String>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl IntentBuilder {
    fn new(intent_type: IntentType, token: &UnifiedToken, amount: &str, destination: IntentDestination) -> Self {
        Self {
            intent_type,
            token: token.clone(),
            amount: amount.to_string(),
            source_chain_id: None,
            destination,
            gas_token: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Send `amount` of `token` to `recipient`.
    pub fn transfer(token: &UnifiedToken, amount: &str, recipient: &str) -> Self {
        Self::new(
            IntentType::Transfer,
            token,
            amount,
            IntentDestination {
                address: Some(recipient.to_string()),
                ..Default::default()
            },
        )
    }

    /// Swap `amount` of `token` into `to_token` on `to_chain_id`.
    pub fn swap(token: &UnifiedToken, amount: &str, to_token: &str, to_chain_id: u64) -> Self {
        Self::new(
            IntentType::Swap,
            token,
            amount,
            IntentDestination {
                token: Some(to_token.to_string()),
                chain_id: Some(to_chain_id),
                ..Default::default()
            },
        )
    }

    /// Move `amount` of `token` to the same token on `to_chain_id`.
    pub fn bridge(token: &UnifiedToken, amount: &str, to_chain_id: u64) -> Self {
        Self::new(
            IntentType::Bridge,
            token,
            amount,
            IntentDestination {
                token: Some(token.symbol.clone()),
                chain_id: Some(to_chain_id),
                ..Default::default()
            },
        )
    }

    /// Spend `amount` of `token` in a call to the dApp contract at `contract`.
    /// Call details travel in [`IntentBuilder::metadata`].
    pub fn app_interaction(token: &UnifiedToken, amount: &str, contract: &str) -> Self {
        Self::new(
            IntentType::AppInteraction,
            token,
            amount,
            IntentDestination {
                address: Some(contract.to_string()),
                ..Default::default()
            },
        )
    }

    /// Spend from a specific chain instead of the first chain balance.
    pub fn from_chain(mut self, chain_id: u64) -> Self {
        self.source_chain_id = Some(chain_id);
        self
    }

    /// Deliver to a specific address (swap/bridge output recipient).
    pub fn recipient(mut self, address: &str) -> Self {
        self.destination.address = Some(address.to_string());
        self
    }

    /// Pay network fees with this token instead of the backend's choice.
    pub fn gas_token(mut self, symbol: &str) -> Self {
        self.gas_token = Some(symbol.to_string());
        self
    }

    pub fn metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Validate the action and produce the intent.
    pub fn build(self) -> Result<TransactionIntent> {
        let source_balance = match self.source_chain_id {
            Some(chain_id) => self.token.balance_on(chain_id).ok_or_else(|| {
                WalletError::InvalidIntent(format!(
                    "{} has no balance on chain {}",
                    self.token.symbol, chain_id
                ))
            })?,
            None => self.token.primary_chain().ok_or_else(|| {
                WalletError::InvalidIntent(format!("{} has no chain balances", self.token.symbol))
            })?,
        };

        match self.intent_type {
            IntentType::Transfer => {
                let recipient = self.destination.address.as_deref().unwrap_or("").trim();
                if recipient.is_empty() {
                    return Err(WalletError::InvalidIntent("transfer requires a recipient".to_string()));
                }
            }
            IntentType::Swap | IntentType::Bridge => {
                let target = self.destination.token.as_deref().unwrap_or("").trim();
                if target.is_empty() || self.destination.chain_id.is_none() {
                    return Err(WalletError::InvalidIntent(
                        "swap and bridge require a destination token and chain".to_string(),
                    ));
                }
            }
            IntentType::AppInteraction => {
                let contract = self.destination.address.as_deref().unwrap_or("").trim();
                if contract.is_empty() {
                    return Err(WalletError::InvalidIntent(
                        "app interaction requires a contract address".to_string(),
                    ));
                }
            }
        }

        let amount = parse_units(&self.amount, source_balance.decimals)?;
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount(format!(
                "'{}' is below one atomic unit of {}",
                self.amount, self.token.symbol
            )));
        }

        debug!(
            "Built {:?} intent: {} {} from chain {}",
            self.intent_type, amount, self.token.symbol, source_balance.chain_id
        );

        Ok(TransactionIntent {
            intent_type: self.intent_type,
            source: IntentSource {
                token: self.token.symbol.clone(),
                chain_id: source_balance.chain_id,
                token_address: source_balance.token_address.clone(),
                amount,
            },
            destination: self.destination,
            gas_token: self.gas_token,
            metadata: self.metadata,
        })
    }
}
