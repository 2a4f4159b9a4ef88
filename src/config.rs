//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the wallet core.
//! Configuration includes the abstraction service connection, status polling,
//! gas thresholds, and the signing capability to construct.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all wallet core settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Abstraction service connection
    pub service: ServiceConfig,
    /// Status polling behavior
    #[serde(default)]
    pub status_polling: StatusPollingConfig,
    /// Native gas sufficiency thresholds
    #[serde(default)]
    pub gas: GasConfig,
    /// Signing capability selection
    #[serde(default)]
    pub signing: SigningConfig,
}

/// Connection settings for the abstraction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the abstraction service (e.g., "https://api.example.com")
    pub api_url: String,
    /// API version path segment appended to `api_url`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServiceConfig {
    /// Versioned API root, e.g. "https://api.example.com/v1".
    pub fn api_root(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        if version.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, version)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// How the tracker treats a `partial` status.
///
/// With `KeepPolling` only `successful`/`failed` end the loop, since the
/// backend may still retry the failed chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialStatusPolicy {
    #[default]
    KeepPolling,
    Terminal,
}

/// Status polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPollingConfig {
    /// Delay between status requests in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Number of status requests before giving up with a timeout
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub partial_status: PartialStatusPolicy,
}

impl Default for StatusPollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            partial_status: PartialStatusPolicy::default(),
        }
    }
}

impl StatusPollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Native balance needed on a chain to cover one average transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeThresholdConfig {
    pub chain_id: u64,
    /// Minimum native amount in atomic units (decimal string)
    pub min_amount: String,
}

/// Gas analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Threshold for chains without an override, atomic units (decimal string)
    #[serde(default = "default_native_threshold")]
    pub default_native_threshold: String,
    /// Per-chain overrides (use [[gas.native_threshold]] in TOML)
    #[serde(rename = "native_threshold", default)]
    pub native_thresholds: Vec<NativeThresholdConfig>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            default_native_threshold: default_native_threshold(),
            native_thresholds: Vec::new(),
        }
    }
}

impl GasConfig {
    /// Threshold for a chain, falling back to the default.
    ///
    /// Unparseable values are rejected by [`WalletConfig::validate`]; here they
    /// fall back to zero so a misconfigured override never blocks aggregation.
    pub fn native_threshold_for(&self, chain_id: u64) -> U256 {
        let raw = self
            .native_thresholds
            .iter()
            .find(|t| t.chain_id == chain_id)
            .map(|t| t.min_amount.as_str())
            .unwrap_or(self.default_native_threshold.as_str());
        U256::from_dec_str(raw).unwrap_or_default()
    }
}

/// Which signing capability to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    #[default]
    SessionWallet,
    ExternalWallet,
    /// Development double: requests go through the signing request queue
    TestDouble,
}

/// Signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub mode: SigningMode,
    /// Environment variable holding the session key share (hex, 32 bytes)
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            mode: SigningMode::default(),
            private_key_env: default_private_key_env(),
        }
    }
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    60
}

fn default_native_threshold() -> String {
    // 0.001 of an 18-decimal native token
    "1000000000000000".to_string()
}

fn default_private_key_env() -> String {
    "WALLET_SESSION_PRIVATE_KEY".to_string()
}

impl WalletConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Path priority: provided path > `WALLET_CONFIG_PATH` env var > `config/wallet.toml`.
    /// The configuration is validated before it is returned.
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var("WALLET_CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/wallet.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config = Self::from_toml_str(&content)?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/wallet.template.toml config/wallet.toml\n\
                Then edit config/wallet.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Loads configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: WalletConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - API URL is an http(s) URL
    /// - Poll interval and attempt count are non-zero
    /// - Gas thresholds are decimal integers, one override per chain
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.service.api_url.trim();
        if url.is_empty() {
            anyhow::bail!("Configuration error: service.api_url must be set");
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!(
                "Configuration error: service.api_url must start with http:// or https:// (got {})",
                url
            );
        }

        if self.status_polling.poll_interval_ms == 0 {
            anyhow::bail!("Configuration error: status_polling.poll_interval_ms must be positive");
        }
        if self.status_polling.max_attempts == 0 {
            anyhow::bail!("Configuration error: status_polling.max_attempts must be positive");
        }

        U256::from_dec_str(&self.gas.default_native_threshold).map_err(|_| {
            anyhow::anyhow!(
                "Configuration error: gas.default_native_threshold '{}' is not a decimal integer",
                self.gas.default_native_threshold
            )
        })?;

        let mut seen = HashSet::new();
        for threshold in &self.gas.native_thresholds {
            if !seen.insert(threshold.chain_id) {
                anyhow::bail!(
                    "Configuration error: duplicate native_threshold for chain ID {}",
                    threshold.chain_id
                );
            }
            U256::from_dec_str(&threshold.min_amount).map_err(|_| {
                anyhow::anyhow!(
                    "Configuration error: native_threshold for chain {} has invalid min_amount '{}'",
                    threshold.chain_id,
                    threshold.min_amount
                )
            })?;
        }

        Ok(())
    }
}
