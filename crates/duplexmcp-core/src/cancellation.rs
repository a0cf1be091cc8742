//! Cancellation signal carrying a reason.
//!
//! Built on [`CancellationToken`] so handlers can `select!` on it; the reason
//! travels alongside and is delivered verbatim to whoever was waiting.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A cloneable cancellation signal. All clones observe the same state.
#[derive(Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<String>>>,
}

impl CancellationSignal {
    /// Create a fresh, uncancelled signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with a reason. The first reason wins; later calls are no-ops.
    pub fn cancel(&self, reason: impl Into<String>) {
        {
            let mut slot = self.reason.lock();
            if slot.is_none() {
                *slot = Some(reason.into());
            }
        }
        self.token.cancel();
    }

    /// Whether the signal has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve when the signal is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The reason supplied at cancellation, if cancelled.
    pub fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
