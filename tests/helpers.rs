//! Shared test helpers for wallet core tests
//!
//! This module provides constants and helper functions used by the integration tests.

#![allow(dead_code)]

use ethereum_types::U256;
use serde_json::{json, Value};
use std::time::Duration;
use wallet_core::config::PartialStatusPolicy;
use wallet_core::service::PollOptions;
use wallet_core::types::{BalancePayload, ChainBalance, IntentResponse, UnifiedToken};
use wallet_core::IntentServiceClient;
use wiremock::MockServer;

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- IDs ----------------------------------

/// Dummy profile ID (UUID format)
pub const DUMMY_PROFILE_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Dummy intent ID
pub const DUMMY_INTENT_ID: &str = "intent-0001";

/// Dummy operation set ID
pub const DUMMY_OPERATION_SET_ID: &str = "opset-0001";

// -------------------------------- USERS ---------------------------------

/// Smart profile address that sends the operations (EVM format, 40 hex characters)
pub const DUMMY_PROFILE_ADDR: &str = "0x0000000000000000000000000000000000000001";

/// Recipient address (EVM format, 40 hex characters)
pub const DUMMY_RECIPIENT_ADDR: &str = "0x0000000000000000000000000000000000000002";

// ------------------------- TOKENS AND CONTRACTS -------------------------

/// USDC contract on Ethereum (EVM format, 40 hex characters)
pub const DUMMY_USDC_ADDR_ETHEREUM: &str = "0x000000000000000000000000000000000000000a";

/// USDC contract on Polygon (EVM format, 40 hex characters)
pub const DUMMY_USDC_ADDR_POLYGON: &str = "0x000000000000000000000000000000000000000b";

/// ERC-20 `transfer(recipient, 100 USDC)` call data
pub const DUMMY_ERC20_TRANSFER_DATA: &str = "0xa9059cbb00000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000005f5e100";

// --------------------------------- CHAINS -------------------------------

pub const ETHEREUM_CHAIN_ID: u64 = 1;
pub const POLYGON_CHAIN_ID: u64 = 137;
pub const ARBITRUM_CHAIN_ID: u64 = 42161;
pub const BSC_CHAIN_ID: u64 = 56;

// ------------------------------ TIMESTAMPS ------------------------------

/// Expiry far in the future (2100-01-01)
pub const FAR_FUTURE_EXPIRY: u64 = 4_102_444_800;

/// Expiry long in the past
pub const PAST_EXPIRY: u64 = 1;

// ------------------------------- SIGNING --------------------------------

/// Ed25519 test key (RFC 8032 test vector 1)
pub const TEST_PRIVATE_KEY_HEX: &str =
    "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

// ============================================================================
// CLIENT HELPERS
// ============================================================================

/// Client pointed at the versioned root of a mock server.
pub fn test_client(server: &MockServer) -> IntentServiceClient {
    IntentServiceClient::new(format!("{}/v1", server.uri())).unwrap()
}

/// Poll options with a short interval so tests run quickly.
pub fn fast_poll_options(max_attempts: u32, partial_status: PartialStatusPolicy) -> PollOptions {
    PollOptions {
        poll_interval: Duration::from_millis(10),
        max_attempts,
        partial_status,
    }
}

// ============================================================================
// BALANCE HELPERS
// ============================================================================

/// JSON for one raw balance entry as returned by the backend.
pub fn balance_entry_json(
    symbol: &str,
    decimals: u8,
    chain_id: u64,
    chain_name: &str,
    amount: &str,
    usd_value: f64,
    is_native: bool,
) -> Value {
    json!({
        "symbol": symbol,
        "name": symbol,
        "decimals": decimals,
        "chainId": chain_id,
        "chainName": chain_name,
        "amount": amount,
        "usdValue": usd_value,
        "tokenAddress": if is_native { Value::Null } else { json!(format!("0x{:040x}", chain_id)) },
        "isNative": is_native,
    })
}

/// JSON for one backend-scored gas token candidate.
pub fn gas_candidate_json(symbol: &str, chain_id: u64, score: u8, available: bool) -> Value {
    json!({
        "symbol": symbol,
        "chainId": chain_id,
        "score": score,
        "estimatedCostUsd": 0.5,
        "available": available,
    })
}

/// Parse a balance payload from raw entries and gas candidates.
pub fn balance_payload(balances: Vec<Value>, gas_tokens: Vec<Value>) -> BalancePayload {
    serde_json::from_value(json!({ "balances": balances, "gasTokens": gas_tokens })).unwrap()
}

/// USDC (6 decimals) held on the given (chain_id, chain_name, atomic amount) chains.
pub fn usdc_token(chains: &[(u64, &str, u64)]) -> UnifiedToken {
    let chain_balances: Vec<ChainBalance> = chains
        .iter()
        .map(|(chain_id, chain_name, amount)| ChainBalance {
            chain_id: *chain_id,
            chain_name: chain_name.to_string(),
            decimals: 6,
            amount: U256::from(*amount),
            token_address: Some(if *chain_id == POLYGON_CHAIN_ID {
                DUMMY_USDC_ADDR_POLYGON.to_string()
            } else {
                DUMMY_USDC_ADDR_ETHEREUM.to_string()
            }),
            is_native: false,
        })
        .collect();

    UnifiedToken {
        symbol: "USDC".to_string(),
        name: "USD Coin".to_string(),
        decimals: 6,
        total_amount: chain_balances.iter().fold(U256::zero(), |acc, c| acc + c.amount),
        total_usd_value: 0.0,
        chain_balances,
    }
}

/// ETH (18 decimals, native) held on Ethereum.
pub fn eth_token(amount: &str) -> UnifiedToken {
    let amount = U256::from_dec_str(amount).unwrap();
    UnifiedToken {
        symbol: "ETH".to_string(),
        name: "Ether".to_string(),
        decimals: 18,
        total_amount: amount,
        total_usd_value: 0.0,
        chain_balances: vec![ChainBalance {
            chain_id: ETHEREUM_CHAIN_ID,
            chain_name: "Ethereum".to_string(),
            decimals: 18,
            amount,
            token_address: None,
            is_native: true,
        }],
    }
}

// ============================================================================
// OPERATION HELPERS
// ============================================================================

/// JSON for one unsigned ERC-20 transfer operation.
pub fn unsigned_operation_json(index: u32, chain_id: u64) -> Value {
    json!({
        "index": index,
        "chainId": chain_id,
        "from": DUMMY_PROFILE_ADDR,
        "to": DUMMY_USDC_ADDR_ETHEREUM,
        "value": "0",
        "data": DUMMY_ERC20_TRANSFER_DATA,
        "gas": { "gasLimit": "65000", "maxFeePerGas": "30000000000" },
        "type": "eip1559",
    })
}

/// JSON for an intent response carrying `operations`.
pub fn intent_response_json(operations: Vec<Value>, expires_at: u64) -> Value {
    json!({
        "intentId": DUMMY_INTENT_ID,
        "operationSetId": DUMMY_OPERATION_SET_ID,
        "estimatedCompletionTime": 30,
        "unsignedOperations": {
            "operations": operations,
            "expiresAt": expires_at,
        },
        "summary": {
            "from": { "token": "USDC", "chainId": 1, "chainName": "Ethereum", "amount": "100" },
            "to": { "token": "USDC", "chainId": 1, "chainName": "Ethereum", "amount": "100", "address": DUMMY_RECIPIENT_ADDR },
            "description": "Send 100 USDC",
        },
        "gasEstimate": { "token": "ETH", "chainId": 1, "amount": "210000000000000", "usdValue": 0.6 },
    })
}

/// Intent response with `count` operations on Ethereum, indices 0..count.
pub fn intent_response(count: u32, expires_at: u64) -> IntentResponse {
    let operations = (0..count).map(|i| unsigned_operation_json(i, ETHEREUM_CHAIN_ID)).collect();
    serde_json::from_value(intent_response_json(operations, expires_at)).unwrap()
}

/// JSON for an operation status response.
pub fn status_json(state: &str) -> Value {
    let chain_state = match state {
        "successful" => "confirmed",
        "failed" => "failed",
        _ => "pending",
    };
    json!({
        "operationSetId": DUMMY_OPERATION_SET_ID,
        "status": state,
        "transactions": [
            { "chainId": 1, "chainName": "Ethereum", "status": chain_state, "txHash": "0xabc" }
        ],
    })
}
