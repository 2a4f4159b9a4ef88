//! Development approver for the test-double signing capability
//!
//! Settles every request that appears in a [`SigningRequestQueue`] with a
//! fixed decision. Used by the CLI's `--auto-approve` mode and by tests that
//! need the queue drained without a UI.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cancel::{wait_cancelled, CancelSignal};
use crate::signing::queue::SigningRequestQueue;

/// How the development approver settles requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

/// Spawn a task that settles queued requests as they arrive.
///
/// Runs until `cancel` fires (forever when `None`) and returns the number of
/// requests it settled.
pub fn spawn_auto_approver(
    queue: Arc<SigningRequestQueue>,
    decision: ApprovalDecision,
    cancel: Option<CancelSignal>,
) -> JoinHandle<usize> {
    let mut updates = queue.subscribe();

    tokio::spawn(async move {
        let mut settled = 0;
        info!("Auto-approver started ({:?})", decision);

        loop {
            let pending = updates.borrow_and_update().clone();
            for request in pending {
                let done = match decision {
                    ApprovalDecision::Approve => queue.approve_request(request.id).await,
                    ApprovalDecision::Reject => queue.reject_request(request.id).await,
                };
                if done {
                    debug!("Auto-approver settled request {}", request.id);
                    settled += 1;
                }
            }

            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = wait_cancelled(cancel.as_ref()) => break,
            }
        }

        info!("Auto-approver stopped after {} request(s)", settled);
        settled
    })
}
