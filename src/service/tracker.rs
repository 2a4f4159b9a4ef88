//! Submission & Status Tracker
//!
//! Submits a complete signed bundle and polls the operation set until it
//! settles.
//!
//! Flow:
//! 1. **Submit**: refuse expired or incomplete bundles, then hand the signed
//!    operations to the backend under the intent's `operation_set_id`.
//! 2. **Poll**: fetch the status every `poll_interval`, report each status to
//!    the caller, and stop on `successful`/`failed` (and `partial` when the
//!    policy makes it terminal).
//! 3. **Timeout**: after `max_attempts` fetches without a terminal status,
//!    fail with [`WalletError::StatusTimeout`]. This is an unknown outcome,
//!    not a failure: the operations may still settle.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api_client::IntentServiceClient;
use crate::cancel::{wait_cancelled, CancelSignal};
use crate::config::{PartialStatusPolicy, StatusPollingConfig};
use crate::error::{Result, WalletError};
use crate::types::{unix_now, IntentResponse, OperationState, OperationStatus, SignedOperation};

/// Progress callback invoked with every fetched status.
pub type StatusCallback<'a> = &'a mut (dyn FnMut(&OperationStatus) + Send);

/// Polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub poll_interval: Duration,
    /// Number of status fetches before giving up; at least one fetch always happens
    pub max_attempts: u32,
    pub partial_status: PartialStatusPolicy,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from(&StatusPollingConfig::default())
    }
}

impl From<&StatusPollingConfig> for PollOptions {
    fn from(config: &StatusPollingConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_attempts: config.max_attempts,
            partial_status: config.partial_status,
        }
    }
}

impl PollOptions {
    /// True when `state` ends polling.
    pub fn is_terminal(&self, state: OperationState) -> bool {
        state.is_final()
            || (state == OperationState::Partial && self.partial_status == PartialStatusPolicy::Terminal)
    }
}

/// Submits signed bundles and tracks their on-chain outcome.
#[derive(Clone)]
pub struct StatusTracker {
    client: IntentServiceClient,
    options: PollOptions,
}

impl StatusTracker {
    pub fn new(client: IntentServiceClient, options: PollOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Submit the signed operations of `intent`.
    ///
    /// # Arguments
    ///
    /// * `intent` - The planned intent the signatures belong to
    /// * `signed_operations` - One signature for every unsigned operation
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The backend accepted the bundle
    /// * `Err(WalletError::IntentExpired)` - The bundle expired; nothing was sent
    /// * `Err(WalletError::InvalidBundle)` - Signatures do not cover the bundle exactly
    pub async fn submit_signed_operations(
        &self,
        intent: &IntentResponse,
        signed_operations: &[SignedOperation],
    ) -> Result<()> {
        if intent.is_expired_at(unix_now()) {
            warn!(
                "Refusing to submit intent {}: expired at {}",
                intent.intent_id, intent.unsigned_operations.expires_at
            );
            return Err(WalletError::IntentExpired {
                intent_id: intent.intent_id.clone(),
                expires_at: intent.unsigned_operations.expires_at,
            });
        }

        let expected: BTreeSet<u32> = intent
            .unsigned_operations
            .operations
            .iter()
            .map(|op| op.index)
            .collect();
        let provided: BTreeSet<u32> = signed_operations.iter().map(|op| op.index).collect();
        if provided != expected || signed_operations.len() != expected.len() {
            return Err(WalletError::InvalidBundle(format!(
                "Intent {} has {} operation(s) but {} signature(s) were provided",
                intent.intent_id,
                expected.len(),
                signed_operations.len()
            )));
        }

        self.client
            .submit_signed_operations(&intent.operation_set_id, signed_operations)
            .await?;
        info!(
            "Submitted {} signed operation(s) for operation set {}",
            signed_operations.len(),
            intent.operation_set_id
        );
        Ok(())
    }

    /// Poll with the tracker's configured options.
    pub async fn poll_operation_status(
        &self,
        operation_set_id: &str,
        on_update: Option<StatusCallback<'_>>,
        cancel: Option<&CancelSignal>,
    ) -> Result<OperationStatus> {
        self.poll_operation_status_with(operation_set_id, &self.options, on_update, cancel)
            .await
    }

    /// Poll until the operation set reaches a terminal status.
    ///
    /// Every fetch counts as one attempt and there is no delay after the last
    /// one. Fetch errors propagate immediately; callers decide whether to retry.
    ///
    /// # Returns
    ///
    /// * `Ok(OperationStatus)` - The terminal status
    /// * `Err(WalletError::StatusTimeout)` - `max_attempts` fetches without a terminal status
    /// * `Err(WalletError::Cancelled)` - `cancel` fired while waiting
    /// * `Err(WalletError::InvalidResponse)` - The backend answered for a different operation set
    pub async fn poll_operation_status_with(
        &self,
        operation_set_id: &str,
        options: &PollOptions,
        mut on_update: Option<StatusCallback<'_>>,
        cancel: Option<&CancelSignal>,
    ) -> Result<OperationStatus> {
        let max_attempts = options.max_attempts.max(1);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let status = tokio::select! {
                biased;
                _ = wait_cancelled(cancel) => return Err(WalletError::Cancelled),
                status = self.client.get_operation_status(operation_set_id) => status?,
            };

            if status.operation_set_id != operation_set_id {
                warn!(
                    "Status for {} reported operation set {}",
                    operation_set_id, status.operation_set_id
                );
                return Err(WalletError::InvalidResponse(format!(
                    "Status requested for operation set {} but received {}",
                    operation_set_id, status.operation_set_id
                )));
            }
            debug!(
                "Operation set {} is {:?} (attempt {}/{})",
                operation_set_id, status.status, attempts, max_attempts
            );

            if let Some(callback) = on_update.as_deref_mut() {
                callback(&status);
            }

            if options.is_terminal(status.status) {
                info!(
                    "Operation set {} settled as {:?} after {} attempt(s)",
                    operation_set_id, status.status, attempts
                );
                return Ok(status);
            }

            if attempts >= max_attempts {
                warn!(
                    "Operation set {} still {:?} after {} attempt(s)",
                    operation_set_id, status.status, attempts
                );
                return Err(WalletError::StatusTimeout {
                    operation_set_id: operation_set_id.to_string(),
                    attempts,
                });
            }

            tokio::select! {
                biased;
                _ = wait_cancelled(cancel) => return Err(WalletError::Cancelled),
                _ = tokio::time::sleep(options.poll_interval) => {}
            }
        }
    }
}
