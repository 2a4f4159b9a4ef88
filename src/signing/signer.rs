//! Operation Signer
//!
//! Signs every operation of an unsigned bundle, in index order, through the
//! active signing capability. A bundle is all-or-nothing: the first failure
//! (rejection, expiry, cancellation, key error) abandons it and no partial
//! signature list ever leaves this module.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cancel::{wait_cancelled, CancelSignal};
use crate::crypto::operation_digest;
use crate::error::{Result, WalletError};
use crate::signing::queue::{RequestKind, SigningRequestQueue, SigningResult};
use crate::types::{unix_now, IntentResponse, SignedOperation, UnsignedOperation, UnsignedOperations};

/// Key custody backend able to sign raw bytes.
///
/// Implemented by the session wallet's key share and by external wallet
/// connectors. Implementations may wait on the user.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Address the signatures belong to.
    fn address(&self) -> String;

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// The signing capability available in the current session.
#[derive(Clone)]
pub enum SigningCapability {
    /// Embedded wallet with a session key share
    SessionWallet(Arc<dyn KeyManager>),
    /// Connected external wallet
    ExternalWallet(Arc<dyn KeyManager>),
    /// Development double: every signature goes through the approval queue
    TestDouble(Arc<SigningRequestQueue>),
}

impl SigningCapability {
    pub fn name(&self) -> &'static str {
        match self {
            SigningCapability::SessionWallet(_) => "session wallet",
            SigningCapability::ExternalWallet(_) => "external wallet",
            SigningCapability::TestDouble(_) => "test double",
        }
    }

    /// Sign one operation, returning a `0x`-prefixed hex signature.
    pub async fn sign_operation(
        &self,
        operation: &UnsignedOperation,
        cancel: Option<&CancelSignal>,
    ) -> Result<String> {
        match self {
            SigningCapability::SessionWallet(keys) | SigningCapability::ExternalWallet(keys) => {
                let digest = operation_digest(operation)?;
                sign_with_keys(keys.as_ref(), &digest, cancel).await
            }
            SigningCapability::TestDouble(queue) => {
                let payload = serde_json::to_value(operation).map_err(|e| {
                    WalletError::Signing(format!("Failed to encode operation {}: {}", operation.index, e))
                })?;
                let result = queue
                    .enqueue_and_wait(RequestKind::Operation, payload, cancel)
                    .await?;
                result.into_signature().ok_or_else(|| {
                    WalletError::Signing(format!(
                        "Operation {} was approved with a transaction hash instead of a signature",
                        operation.index
                    ))
                })
            }
        }
    }

    /// Sign a Sign-In-With-Ethereum message.
    pub async fn sign_message(&self, message: &str, cancel: Option<&CancelSignal>) -> Result<String> {
        match self {
            SigningCapability::SessionWallet(keys) | SigningCapability::ExternalWallet(keys) => {
                sign_with_keys(keys.as_ref(), message.as_bytes(), cancel).await
            }
            SigningCapability::TestDouble(queue) => {
                let payload = serde_json::json!({ "message": message });
                let result = queue.enqueue_and_wait(RequestKind::Siwe, payload, cancel).await?;
                result.into_signature().ok_or_else(|| {
                    WalletError::Signing("Message was approved with a transaction hash".to_string())
                })
            }
        }
    }

    /// Send a dApp transaction request, returning its `0x`-prefixed transaction hash.
    ///
    /// Only the test double can settle raw transactions: it queues a
    /// [`RequestKind::Transaction`] request and waits for approval. Session and
    /// external wallets hold keys but no broadcast path; value moves through
    /// intents, so they fail with [`WalletError::Signing`] without prompting.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Transaction hash of the approved request
    /// * `Err(WalletError::UserRejected)` - The user declined the request
    /// * `Err(WalletError::Cancelled)` - `cancel` fired or the session was reset
    pub async fn send_transaction(
        &self,
        transaction: serde_json::Value,
        cancel: Option<&CancelSignal>,
    ) -> Result<String> {
        match self {
            SigningCapability::SessionWallet(_) | SigningCapability::ExternalWallet(_) => {
                Err(WalletError::Signing(format!(
                    "{} cannot send raw transactions, submit an intent instead",
                    self.name()
                )))
            }
            SigningCapability::TestDouble(queue) => {
                match queue
                    .enqueue_and_wait(RequestKind::Transaction, transaction, cancel)
                    .await?
                {
                    SigningResult::TransactionHash(hash) => Ok(hash),
                    SigningResult::Signature(_) => Err(WalletError::Signing(
                        "Transaction was approved with a signature instead of a transaction hash"
                            .to_string(),
                    )),
                }
            }
        }
    }
}

async fn sign_with_keys(
    keys: &dyn KeyManager,
    message: &[u8],
    cancel: Option<&CancelSignal>,
) -> Result<String> {
    tokio::select! {
        biased;
        _ = wait_cancelled(cancel) => Err(WalletError::Cancelled),
        signature = keys.sign(message) => Ok(format!("0x{}", hex::encode(signature?))),
    }
}

/// Signs unsigned operation bundles with one capability.
#[derive(Clone)]
pub struct OperationSigner {
    capability: SigningCapability,
}

impl OperationSigner {
    pub fn new(capability: SigningCapability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> &SigningCapability {
        &self.capability
    }

    /// Sign the whole bundle of a planned intent.
    pub async fn sign_operations(
        &self,
        intent: &IntentResponse,
        cancel: Option<&CancelSignal>,
    ) -> Result<Vec<SignedOperation>> {
        self.sign_bundle(&intent.intent_id, &intent.unsigned_operations, cancel)
            .await
    }

    /// Sign every operation of `bundle` in ascending index order.
    ///
    /// Expiry is checked before starting and again before each operation, as a
    /// user may take a long time to approve.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SignedOperation>)` - One signature per operation, in index order
    /// * `Err(WalletError::IntentExpired)` - The bundle expired before signing finished
    /// * `Err(WalletError::UserRejected)` - The user declined one of the operations
    /// * `Err(WalletError::InvalidBundle)` - Empty bundle or duplicate indices
    pub async fn sign_bundle(
        &self,
        intent_id: &str,
        bundle: &UnsignedOperations,
        cancel: Option<&CancelSignal>,
    ) -> Result<Vec<SignedOperation>> {
        if bundle.operations.is_empty() {
            return Err(WalletError::InvalidBundle(format!(
                "Intent {} has no operations to sign",
                intent_id
            )));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = bundle.operations.iter().find(|op| !seen.insert(op.index)) {
            return Err(WalletError::InvalidBundle(format!(
                "Intent {} has duplicate operation index {}",
                intent_id, duplicate.index
            )));
        }

        let mut ordered: Vec<&UnsignedOperation> = bundle.operations.iter().collect();
        ordered.sort_by_key(|op| op.index);

        info!(
            "Signing {} operation(s) for intent {} with {}",
            ordered.len(),
            intent_id,
            self.capability.name()
        );

        let mut signed = Vec::with_capacity(ordered.len());
        for operation in ordered {
            if cancel.map(CancelSignal::is_cancelled).unwrap_or(false) {
                return Err(WalletError::Cancelled);
            }
            ensure_not_expired(intent_id, bundle)?;

            let signature = match self.capability.sign_operation(operation, cancel).await {
                Ok(signature) => signature,
                Err(e) => {
                    warn!(
                        "Abandoning bundle for intent {} at operation {}: {}",
                        intent_id, operation.index, e
                    );
                    return Err(e);
                }
            };

            signed.push(SignedOperation {
                index: operation.index,
                signature,
                signed_typed_data: None,
            });
        }

        info!("Signed all {} operation(s) for intent {}", signed.len(), intent_id);
        Ok(signed)
    }
}

fn ensure_not_expired(intent_id: &str, bundle: &UnsignedOperations) -> Result<()> {
    if bundle.is_expired_at(unix_now()) {
        warn!("Intent {} expired at {}", intent_id, bundle.expires_at);
        return Err(WalletError::IntentExpired {
            intent_id: intent_id.to_string(),
            expires_at: bundle.expires_at,
        });
    }
    Ok(())
}
