//! Wallet CLI
//!
//! Developer tool that drives the transaction pipeline against an
//! abstraction service:
//! - `balance`: unified balance and gas analysis of a profile
//! - `send` / `swap`: build an intent, sign it, submit, and wait for the outcome
//! - `status`: read (or wait for) the status of an operation set
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin wallet-cli -- --config config/wallet.toml balance --profile <id>
//! cargo run --bin wallet-cli -- send --profile <id> --token USDC --amount 100 --to 0xabc...
//! ```
//!
//! With `signing.mode = "test_double"` every signature goes through the
//! signing request queue; requests are confirmed on stdin unless
//! `--auto-approve` is given.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use wallet_core::{
    cancel_pair, format_units, spawn_auto_approver, ApprovalDecision, BalanceAggregator,
    CancelSignal, IntentBuilder, IntentServiceClient, LocalKeySigner, SigningCapability,
    SigningMode, SigningRequestQueue, TransactionOutcome, TransactionPipeline, WalletConfig,
};
use wallet_core::service::PollOptions;
use wallet_core::types::{OperationStatus, UnifiedBalance};

#[derive(Parser, Debug)]
#[command(name = "wallet-cli")]
#[command(about = "Chain-abstracted wallet pipeline - balances, intents, signing, and status")]
struct Cli {
    /// Path to wallet configuration file (default: config/wallet.toml or WALLET_CONFIG_PATH env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the unified balance and gas analysis of a profile
    Balance {
        #[arg(long)]
        profile: String,
    },
    /// Transfer a token to a recipient
    Send {
        #[command(flatten)]
        spend: SpendArgs,
        /// Recipient address
        #[arg(long)]
        to: String,
    },
    /// Swap a token into another token on a destination chain
    Swap {
        #[command(flatten)]
        spend: SpendArgs,
        #[arg(long)]
        to_token: String,
        #[arg(long)]
        to_chain: u64,
    },
    /// Show the status of an operation set
    Status {
        #[arg(long)]
        operation_set: String,
        /// Poll until the operation set settles
        #[arg(long)]
        wait: bool,
    },
}

#[derive(Args, Debug)]
struct SpendArgs {
    #[arg(long)]
    profile: String,
    /// Token symbol to spend
    #[arg(long)]
    token: String,
    /// Amount in human units, e.g. "12.5"
    #[arg(long)]
    amount: String,
    /// Spend from this chain instead of the token's first chain balance
    #[arg(long)]
    from_chain: Option<u64>,
    /// Pay network fees with this token
    #[arg(long)]
    gas_token: Option<String>,
    /// Approve test-double signing requests without prompting
    #[arg(long)]
    auto_approve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Priority: CLI arg > env var > default
    let config = WalletConfig::load_from_path(cli.config.as_deref())?;
    info!("Abstraction service: {}", config.service.api_root());

    let client = IntentServiceClient::from_config(&config.service)?;

    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel_handle.cancel();
        }
    });

    match cli.command {
        Command::Balance { profile } => {
            let aggregator = BalanceAggregator::new(client, config.gas.clone());
            let balance = aggregator.get_unified_balance(&profile).await?;
            print_balance(&balance);
        }
        Command::Send { spend, to } => {
            let aggregator = BalanceAggregator::new(client.clone(), config.gas.clone());
            let balance = aggregator.get_unified_balance(&spend.profile).await?;
            let token = balance
                .token(&spend.token)
                .with_context(|| format!("Profile holds no {}", spend.token))?;

            let builder = IntentBuilder::transfer(token, &spend.amount, &to);
            let outcome = run_intent(&config, client, builder, &spend, &cancel).await?;
            print_outcome(&outcome);
        }
        Command::Swap {
            spend,
            to_token,
            to_chain,
        } => {
            let aggregator = BalanceAggregator::new(client.clone(), config.gas.clone());
            let balance = aggregator.get_unified_balance(&spend.profile).await?;
            let token = balance
                .token(&spend.token)
                .with_context(|| format!("Profile holds no {}", spend.token))?;

            let builder = IntentBuilder::swap(token, &spend.amount, &to_token, to_chain);
            let outcome = run_intent(&config, client, builder, &spend, &cancel).await?;
            print_outcome(&outcome);
        }
        Command::Status {
            operation_set,
            wait,
        } => {
            let status = if wait {
                let tracker = wallet_core::StatusTracker::new(
                    client,
                    PollOptions::from(&config.status_polling),
                );
                let mut on_update = |status: &OperationStatus| {
                    info!("Operation set {} is {:?}", status.operation_set_id, status.status);
                };
                tracker
                    .poll_operation_status(&operation_set, Some(&mut on_update), Some(&cancel))
                    .await?
            } else {
                client.get_operation_status(&operation_set).await?
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

/// Build, sign, submit, and track one intent.
async fn run_intent(
    config: &WalletConfig,
    client: IntentServiceClient,
    mut builder: IntentBuilder,
    spend: &SpendArgs,
    cancel: &CancelSignal,
) -> Result<TransactionOutcome> {
    if let Some(chain_id) = spend.from_chain {
        builder = builder.from_chain(chain_id);
    }
    if let Some(gas_token) = &spend.gas_token {
        builder = builder.gas_token(gas_token);
    }
    let intent = builder.build()?;

    let capability = signing_capability(config, spend.auto_approve, cancel)?;
    let pipeline = TransactionPipeline::new(
        client,
        capability,
        PollOptions::from(&config.status_polling),
    );

    let planned = pipeline.prepare(&spend.profile, &intent).await?;
    println!("{}", serde_json::to_string_pretty(&planned.summary)?);
    info!(
        "Estimated fee: {} {}",
        planned.gas_estimate.amount, planned.gas_estimate.token
    );

    let mut on_update = |status: &OperationStatus| {
        info!("Operation set {} is {:?}", status.operation_set_id, status.status);
    };
    let outcome = pipeline
        .execute_prepared(planned, Some(&mut on_update), Some(cancel))
        .await?;
    Ok(outcome)
}

/// Construct the signing capability selected by configuration.
fn signing_capability(
    config: &WalletConfig,
    auto_approve: bool,
    cancel: &CancelSignal,
) -> Result<SigningCapability> {
    match config.signing.mode {
        SigningMode::SessionWallet => {
            let signer = LocalKeySigner::from_env(&config.signing.private_key_env)
                .with_context(|| {
                    format!(
                        "Failed to load session key from {}",
                        config.signing.private_key_env
                    )
                })?;
            Ok(SigningCapability::SessionWallet(Arc::new(signer)))
        }
        SigningMode::ExternalWallet => {
            anyhow::bail!("signing.mode = \"external_wallet\" requires a wallet connector; the CLI has none")
        }
        SigningMode::TestDouble => {
            let queue = Arc::new(SigningRequestQueue::new());
            if auto_approve {
                spawn_auto_approver(queue.clone(), ApprovalDecision::Approve, Some(cancel.clone()));
            } else {
                spawn_prompt_approver(queue.clone(), cancel.clone());
            }
            Ok(SigningCapability::TestDouble(queue))
        }
    }
}

/// Ask on stdin for every request that appears in the queue.
fn spawn_prompt_approver(queue: Arc<SigningRequestQueue>, cancel: CancelSignal) {
    let mut updates = queue.subscribe();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut prompted = HashSet::new();

        loop {
            let pending = updates.borrow_and_update().clone();
            for request in pending {
                if !prompted.insert(request.id) {
                    continue;
                }
                println!(
                    "Signing request {} ({:?}):\n{}",
                    request.id,
                    request.kind,
                    serde_json::to_string_pretty(&request.payload).unwrap_or_default()
                );
                println!("Approve? [y/N]");

                let answer = tokio::select! {
                    line = lines.next_line() => line.ok().flatten().unwrap_or_default(),
                    _ = cancel.cancelled() => return,
                };
                if answer.trim().eq_ignore_ascii_case("y") {
                    queue.approve_request(request.id).await;
                } else {
                    queue.reject_request(request.id).await;
                }
            }

            tokio::select! {
                _ = updates.changed() => {}
                _ = cancel.cancelled() => return,
            }
        }
    });
}

fn print_balance(balance: &UnifiedBalance) {
    println!("Total: ${:.2}", balance.total_usd_value);
    for token in &balance.tokens {
        println!(
            "  {} {} (${:.2})",
            format_units(token.total_amount, token.decimals),
            token.symbol,
            token.total_usd_value
        );
        for chain in &token.chain_balances {
            println!(
                "    {}: {}",
                chain.chain_name,
                format_units(chain.amount, chain.decimals)
            );
        }
    }

    let gas = &balance.gas_analysis;
    for native in &gas.native_gas_balances {
        println!(
            "  Gas on {}: {} ({})",
            native.chain_name,
            native.symbol,
            if native.has_enough_gas { "sufficient" } else { "insufficient" }
        );
    }
    match &gas.suggested_gas_token {
        Some(suggestion) => println!(
            "Suggested gas token: {} on chain {} (score {})",
            suggestion.symbol, suggestion.chain_id, suggestion.score
        ),
        None => println!("No gas token available"),
    }
}

fn print_outcome(outcome: &TransactionOutcome) {
    println!(
        "Operation set {}: {:?}",
        outcome.intent.operation_set_id, outcome.status.status
    );
    for tx in &outcome.status.transactions {
        println!(
            "  chain {}: {:?} {}",
            tx.chain_id,
            tx.status,
            tx.tx_hash.as_deref().unwrap_or("-")
        );
    }
    if let Some(error) = &outcome.status.error {
        println!("  error: {}", error);
    }
}
