use std::sync::Arc;
use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

/// Why a turn was cancelled. Carried on the signal itself so the unwind path
/// never has to infer the cause from a side flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The user asked generation to stop.
    UserStop,
    /// The inactivity watchdog fired: no events within the threshold.
    Inactivity,
}

/// Cooperative cancellation for one chat turn. Cloning shares the signal.
///
/// `cancel` is idempotent: the first reason wins, later calls (including
/// calls after the turn already finished) are no-ops.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self, reason: CancelReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The recorded reason, if cancellation happened.
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }
}
