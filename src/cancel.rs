//! Cancellation signal for in-flight waits
//!
//! A [`CancelHandle`] is held by whoever may abandon an attempt (for example a
//! closing confirmation screen); the matching [`CancelSignal`] is threaded into
//! `enqueue_and_wait`, operation signing, and status polling.

use tokio::sync::watch;

/// Sender side: cancels every signal cloned from the same pair.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

/// Receiver side: resolves [`CancelSignal::cancelled`] once the handle cancels.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace succeeds even when every signal has been dropped
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until cancelled.
    ///
    /// If the handle is dropped without cancelling this never resolves.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Wait on an optional signal; `None` never resolves.
pub(crate) async fn wait_cancelled(signal: Option<&CancelSignal>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}
