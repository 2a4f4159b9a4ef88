//! Signing Request Queue
//!
//! FIFO queue of pending approval requests. Each entry owns the completion
//! handle of the caller waiting in [`SigningRequestQueue::enqueue_and_wait`];
//! the approval side (wallet UI, development double, or test harness) settles
//! it with [`approve_request`](SigningRequestQueue::approve_request) or
//! [`reject_request`](SigningRequestQueue::reject_request).
//!
//! Request lifecycle: `created` -> `approved` | `rejected`, exactly once.
//!
//! - Ids increase monotonically and are never reused, including across [`reset`](SigningRequestQueue::reset).
//! - Arrival order is kept for display; approval may happen in any order.
//! - Settling and removal happen under one lock, so no reader ever observes an
//!   entry whose caller has already been resolved.
//! - The queue never times requests out. Callers pass a [`CancelSignal`] to
//!   abandon a wait.
//! - Dropping the waiting future (for example under `tokio::time::timeout`)
//!   withdraws its request. If the queue is locked at that moment, the entry
//!   is pruned by the next operation that takes the lock.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tokio::sync::{oneshot, watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::cancel::{wait_cancelled, CancelSignal};
use crate::error::{Result, WalletError};

/// Identifier of a pending request, unique for the lifetime of the queue.
pub type RequestId = u64;

/// What the caller is asking the user to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Send a transaction; approval yields a transaction hash
    Transaction,
    /// Sign-in-with-Ethereum message; approval yields a signature
    Siwe,
    /// Sign one planned operation; approval yields a signature
    Operation,
}

/// Snapshot of a queued request as shown to the approver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    /// Opaque request body (transaction, message, or operation)
    pub payload: serde_json::Value,
}

/// Value a request is approved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningResult {
    TransactionHash(String),
    Signature(String),
}

impl SigningResult {
    pub fn as_str(&self) -> &str {
        match self {
            SigningResult::TransactionHash(s) | SigningResult::Signature(s) => s,
        }
    }

    /// Returns the signature, or `None` for a transaction hash.
    pub fn into_signature(self) -> Option<String> {
        match self {
            SigningResult::Signature(s) => Some(s),
            SigningResult::TransactionHash(_) => None,
        }
    }
}

struct QueueEntry {
    request: PendingRequest,
    responder: oneshot::Sender<Result<SigningResult>>,
}

struct QueueState {
    next_id: RequestId,
    entries: Vec<QueueEntry>,
}

impl QueueState {
    /// Drop entries whose caller is no longer waiting. Returns true if any were removed.
    fn prune_abandoned(&mut self) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !e.responder.is_closed());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!("Pruned {} abandoned signing request(s)", pruned);
        }
        pruned > 0
    }
}

/// Withdraws a request when the waiting future is dropped before it resolves.
struct WithdrawOnDrop<'a> {
    queue: &'a SigningRequestQueue,
    id: RequestId,
    armed: bool,
}

impl Drop for WithdrawOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Contended lock: the closed responder gets pruned by the lock holder's successor.
        if let Ok(mut state) = self.queue.state.try_lock() {
            if let Some(position) = state.entries.iter().position(|e| e.request.id == self.id) {
                state.entries.remove(position);
                self.queue.publish(&state);
                info!("Signing request {} abandoned by caller", self.id);
            }
        }
    }
}

/// Process-wide queue of signing requests for the active session.
pub struct SigningRequestQueue {
    state: Mutex<QueueState>,
    snapshot: watch::Sender<Vec<PendingRequest>>,
}

impl Default for SigningRequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningRequestQueue {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            state: Mutex::new(QueueState {
                next_id: 1,
                entries: Vec::new(),
            }),
            snapshot,
        }
    }

    /// Queue a request and wait until it is approved, rejected, or cancelled.
    ///
    /// # Returns
    ///
    /// * `Ok(SigningResult)` - The request was approved
    /// * `Err(WalletError::UserRejected)` - The request was rejected
    /// * `Err(WalletError::Cancelled)` - `cancel` fired first, or the session was reset
    pub async fn enqueue_and_wait(
        &self,
        kind: RequestKind,
        payload: serde_json::Value,
        cancel: Option<&CancelSignal>,
    ) -> Result<SigningResult> {
        let (responder, mut receiver) = oneshot::channel();

        let id = {
            let mut state = self.lock_live().await;
            let id = state.next_id;
            state.next_id += 1;
            state.entries.push(QueueEntry {
                request: PendingRequest { id, kind, payload },
                responder,
            });
            self.publish(&state);
            id
        };
        info!("Queued {:?} signing request {}", kind, id);
        let mut guard = WithdrawOnDrop {
            queue: self,
            id,
            armed: true,
        };

        let settled = tokio::select! {
            biased;
            settled = &mut receiver => Some(settled),
            _ = wait_cancelled(cancel) => None,
        };

        let outcome = match settled {
            Some(Ok(result)) => result,
            // Responder dropped without settling
            Some(Err(_)) => Err(WalletError::Cancelled),
            None => self.withdraw(id, receiver).await,
        };
        guard.armed = false;
        outcome
    }

    /// Remove a cancelled request, unless an approver settled it first.
    async fn withdraw(
        &self,
        id: RequestId,
        mut receiver: oneshot::Receiver<Result<SigningResult>>,
    ) -> Result<SigningResult> {
        let mut state = self.lock_live().await;
        if let Some(position) = state.entries.iter().position(|e| e.request.id == id) {
            state.entries.remove(position);
            self.publish(&state);
            info!("Signing request {} withdrawn by caller", id);
            return Err(WalletError::Cancelled);
        }
        drop(state);

        // Settled between the cancel firing and taking the lock; the settled value wins.
        match receiver.try_recv() {
            Ok(result) => result,
            Err(_) => Err(WalletError::Cancelled),
        }
    }

    /// Approve a request with a synthesized result.
    ///
    /// Transactions resolve with a transaction hash; SIWE messages and
    /// operations resolve with a signature. Unknown ids are ignored.
    ///
    /// # Returns
    ///
    /// * `true` - The request was found and settled
    /// * `false` - No request with this id (already settled, abandoned, or never queued)
    pub async fn approve_request(&self, id: RequestId) -> bool {
        self.settle(id, |request| Ok(synthesize_result(request))).await
    }

    /// Approve a request with a result produced by the real signing path.
    pub async fn approve_request_with(&self, id: RequestId, result: SigningResult) -> bool {
        self.settle(id, move |_| Ok(result)).await
    }

    /// Reject a request; the caller receives [`WalletError::UserRejected`].
    pub async fn reject_request(&self, id: RequestId) -> bool {
        self.settle(id, |request| {
            Err(WalletError::UserRejected {
                request_id: request.id,
            })
        })
        .await
    }

    async fn settle<F>(&self, id: RequestId, outcome: F) -> bool
    where
        F: FnOnce(&PendingRequest) -> Result<SigningResult>,
    {
        let mut state = self.lock_live().await;
        let Some(position) = state.entries.iter().position(|e| e.request.id == id) else {
            debug!("Ignoring settlement of unknown signing request {}", id);
            return false;
        };

        let entry = state.entries.remove(position);
        let result = outcome(&entry.request);
        let approved = result.is_ok();
        if entry.responder.send(result).is_err() {
            warn!("Caller of signing request {} stopped waiting before settlement", id);
        }
        self.publish(&state);
        drop(state);

        if approved {
            info!("Approved {:?} signing request {}", entry.request.kind, id);
        } else {
            info!("Rejected {:?} signing request {}", entry.request.kind, id);
        }
        true
    }

    /// Current requests in arrival order.
    pub async fn pending_requests(&self) -> Vec<PendingRequest> {
        let state = self.lock_live().await;
        state.entries.iter().map(|e| e.request.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.lock_live().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Observe the queue contents; a new snapshot is published on every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<PendingRequest>> {
        self.snapshot.subscribe()
    }

    /// Drop every pending request at logout. Waiting callers receive `Cancelled`.
    ///
    /// Returns the number of requests dropped.
    pub async fn reset(&self) -> usize {
        let mut state = self.lock_live().await;
        let entries = std::mem::take(&mut state.entries);
        let count = entries.len();
        for entry in entries {
            let _ = entry.responder.send(Err(WalletError::Cancelled));
        }
        self.publish(&state);
        if count > 0 {
            info!("Signing queue reset, {} pending request(s) cancelled", count);
        }
        count
    }

    /// Take the state lock with abandoned entries already removed.
    async fn lock_live(&self) -> MutexGuard<'_, QueueState> {
        let mut state = self.state.lock().await;
        if state.prune_abandoned() {
            self.publish(&state);
        }
        state
    }

    fn publish(&self, state: &QueueState) {
        self.snapshot
            .send_replace(state.entries.iter().map(|e| e.request.clone()).collect());
    }
}

/// Result the development double approves a request with.
///
/// Deterministic in the request id and payload: a 32-byte hash for
/// transactions, a 65-byte signature (r || s || v) otherwise.
pub fn synthesize_result(request: &PendingRequest) -> SigningResult {
    let digest = |tag: &[u8]| {
        let mut hasher = Keccak256::new();
        hasher.update(tag);
        hasher.update(request.id.to_be_bytes());
        hasher.update(request.payload.to_string().as_bytes());
        hasher.finalize()
    };

    match request.kind {
        RequestKind::Transaction => {
            SigningResult::TransactionHash(format!("0x{}", hex::encode(digest(b"tx"))))
        }
        RequestKind::Siwe | RequestKind::Operation => {
            let mut signature = Vec::with_capacity(65);
            signature.extend_from_slice(&digest(b"r"));
            signature.extend_from_slice(&digest(b"s"));
            signature.push(27);
            SigningResult::Signature(format!("0x{}", hex::encode(signature)))
        }
    }
}
