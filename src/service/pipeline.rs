//! Transaction pipeline
//!
//! End-to-end orchestration of one user action:
//! create intent -> sign every operation -> submit -> poll until settled.
//!
//! Failures before submission leave nothing on the backend. Failures after
//! submission (a status timeout in particular) mean the outcome is unknown;
//! the caller still holds the `operation_set_id` from the returned intent
//! response and may resume polling.

use tracing::info;

use crate::api_client::IntentServiceClient;
use crate::cancel::CancelSignal;
use crate::config::WalletConfig;
use crate::error::Result;
use crate::service::tracker::{PollOptions, StatusCallback, StatusTracker};
use crate::signing::{OperationSigner, SigningCapability};
use crate::types::{IntentResponse, OperationState, OperationStatus, SignedOperation, TransactionIntent};

/// Result of a pipeline run that reached a terminal status.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub intent: IntentResponse,
    pub signed_operations: Vec<SignedOperation>,
    pub status: OperationStatus,
}

impl TransactionOutcome {
    pub fn is_successful(&self) -> bool {
        self.status.status == OperationState::Successful
    }
}

/// Drives intents through creation, signing, submission, and tracking.
pub struct TransactionPipeline {
    client: IntentServiceClient,
    signer: OperationSigner,
    tracker: StatusTracker,
}

impl TransactionPipeline {
    pub fn new(client: IntentServiceClient, capability: SigningCapability, poll_options: PollOptions) -> Self {
        Self {
            tracker: StatusTracker::new(client.clone(), poll_options),
            signer: OperationSigner::new(capability),
            client,
        }
    }

    /// Build a pipeline from loaded configuration.
    pub fn from_config(config: &WalletConfig, capability: SigningCapability) -> Result<Self> {
        let client = IntentServiceClient::from_config(&config.service)?;
        Ok(Self::new(
            client,
            capability,
            PollOptions::from(&config.status_polling),
        ))
    }

    pub fn client(&self) -> &IntentServiceClient {
        &self.client
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// Create the intent and return the plan for the confirmation screen.
    pub async fn prepare(&self, profile_id: &str, intent: &TransactionIntent) -> Result<IntentResponse> {
        self.client.create_transaction_intent(profile_id, intent).await
    }

    /// Sign, submit, and track a plan returned by [`prepare`](Self::prepare).
    pub async fn execute_prepared(
        &self,
        intent: IntentResponse,
        on_update: Option<StatusCallback<'_>>,
        cancel: Option<&CancelSignal>,
    ) -> Result<TransactionOutcome> {
        let signed_operations = self.signer.sign_operations(&intent, cancel).await?;
        self.tracker
            .submit_signed_operations(&intent, &signed_operations)
            .await?;

        let status = self
            .tracker
            .poll_operation_status(&intent.operation_set_id, on_update, cancel)
            .await?;

        info!(
            "Intent {} finished as {:?} (operation set {})",
            intent.intent_id, status.status, intent.operation_set_id
        );
        Ok(TransactionOutcome {
            intent,
            signed_operations,
            status,
        })
    }

    /// Run the whole pipeline for one intent.
    ///
    /// # Arguments
    ///
    /// * `profile_id` - Smart profile the intent spends from
    /// * `intent` - Intent built by [`IntentBuilder`](crate::intent::IntentBuilder)
    /// * `on_update` - Called with every status fetched while polling
    /// * `cancel` - Abandons signing or polling when fired
    pub async fn execute(
        &self,
        profile_id: &str,
        intent: &TransactionIntent,
        on_update: Option<StatusCallback<'_>>,
        cancel: Option<&CancelSignal>,
    ) -> Result<TransactionOutcome> {
        let planned = self.prepare(profile_id, intent).await?;
        self.execute_prepared(planned, on_update, cancel).await
    }
}
