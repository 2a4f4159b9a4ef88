//! Unit tests for configuration module

use ethereum_types::U256;
use std::time::Duration;
use wallet_core::config::{
    GasConfig, NativeThresholdConfig, PartialStatusPolicy, SigningMode, WalletConfig,
};
use wallet_core::service::PollOptions;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Create a minimal valid WalletConfig for testing
fn create_test_config() -> WalletConfig {
    WalletConfig::from_toml_str(
        r#"
        [service]
        api_url = "http://127.0.0.1:3000/"
        "#,
    )
    .unwrap()
}

// ============================================================================
// PARSING TESTS
// ============================================================================

/// What is tested: the shipped template parses and validates
/// Why: New deployments start by copying the template
#[test]
fn test_template_parses() {
    let content = std::fs::read_to_string("config/wallet.template.toml").unwrap();
    let config = WalletConfig::from_toml_str(&content).unwrap();

    assert_eq!(config.signing.mode, SigningMode::SessionWallet);
    assert_eq!(config.gas.native_thresholds.len(), 1);
    assert_eq!(config.gas.native_threshold_for(101), U256::from(5_000_000u64));
}

/// What is tested: omitted sections fall back to defaults
/// Why: Only the service URL is mandatory
#[test]
fn test_minimal_config_uses_defaults() {
    let config = create_test_config();

    assert_eq!(config.service.api_root(), "http://127.0.0.1:3000/v1");
    assert_eq!(config.service.request_timeout(), Duration::from_secs(30));
    assert_eq!(config.status_polling.poll_interval(), Duration::from_millis(2000));
    assert_eq!(config.status_polling.max_attempts, 60);
    assert_eq!(config.status_polling.partial_status, PartialStatusPolicy::KeepPolling);
    assert_eq!(config.signing.mode, SigningMode::SessionWallet);
    assert_eq!(config.signing.private_key_env, "WALLET_SESSION_PRIVATE_KEY");

    let options = PollOptions::from(&config.status_polling);
    assert_eq!(options, PollOptions::default());
}

/// What is tested: the partial status policy and signing mode parse from snake_case
/// Why: Both are deployment decisions made in the config file
#[test]
fn test_policy_and_mode_parse() {
    let config = WalletConfig::from_toml_str(
        r#"
        [service]
        api_url = "https://api.example.com"
        api_version = ""

        [status_polling]
        partial_status = "terminal"

        [signing]
        mode = "test_double"
        "#,
    )
    .unwrap();

    assert_eq!(config.service.api_root(), "https://api.example.com");
    assert_eq!(config.status_polling.partial_status, PartialStatusPolicy::Terminal);
    assert_eq!(config.signing.mode, SigningMode::TestDouble);
}

/// What is tested: native_threshold_for() prefers a per-chain override
/// Why: Gas costs differ between chains
#[test]
fn test_native_threshold_lookup() {
    let gas = GasConfig {
        default_native_threshold: "1000".to_string(),
        native_thresholds: vec![NativeThresholdConfig {
            chain_id: 137,
            min_amount: "10".to_string(),
        }],
    };

    assert_eq!(gas.native_threshold_for(137), U256::from(10u64));
    assert_eq!(gas.native_threshold_for(1), U256::from(1000u64));
}

// ============================================================================
// VALIDATION TESTS
// ============================================================================

/// What is tested: WalletConfig::validate() accepts valid configuration
/// Why: Ensure valid configs pass validation
#[test]
fn test_config_validation_success() {
    let config = create_test_config();
    assert!(config.validate().is_ok());
}

/// What is tested: WalletConfig::validate() rejects a URL without an http(s) scheme
/// Why: The client cannot reach a service without a usable base URL
#[test]
fn test_config_validation_rejects_bad_url() {
    let mut config = create_test_config();
    config.service.api_url = "ftp://127.0.0.1".to_string();
    assert!(config.validate().is_err());

    config.service.api_url = "  ".to_string();
    assert!(config.validate().is_err());
}

/// What is tested: WalletConfig::validate() rejects zero polling parameters
/// Why: A zero interval would spin; zero attempts would never fetch
#[test]
fn test_config_validation_rejects_zero_polling() {
    let mut config = create_test_config();
    config.status_polling.poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = create_test_config();
    config.status_polling.max_attempts = 0;
    assert!(config.validate().is_err());
}

/// What is tested: WalletConfig::validate() rejects duplicate and malformed thresholds
/// Why: Ambiguous or unparseable thresholds would silently change gas analysis
#[test]
fn test_config_validation_rejects_bad_thresholds() {
    let mut config = create_test_config();
    config.gas.native_thresholds = vec![
        NativeThresholdConfig { chain_id: 1, min_amount: "1".to_string() },
        NativeThresholdConfig { chain_id: 1, min_amount: "2".to_string() },
    ];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate"));

    let mut config = create_test_config();
    config.gas.native_thresholds = vec![NativeThresholdConfig {
        chain_id: 1,
        min_amount: "0.5".to_string(),
    }];
    assert!(config.validate().is_err());

    let mut config = create_test_config();
    config.gas.default_native_threshold = "lots".to_string();
    assert!(config.validate().is_err());
}

/// What is tested: loading a missing file points the user at the template
/// Why: First-run setup should say exactly what to do
#[test]
fn test_load_missing_file_mentions_template() {
    let err = WalletConfig::load_from_path(Some("config/does-not-exist.toml")).unwrap_err();
    assert!(err.to_string().contains("wallet.template.toml"));
}
