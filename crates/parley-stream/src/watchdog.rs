use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

use parley_core::cancel::{CancelReason, CancelSignal};

/// Converts stream silence into a forced cancellation.
///
/// The watchdog owns a background task holding the current deadline; every
/// `rearm` pushes the deadline out by the threshold. If the deadline passes,
/// the shared signal is cancelled with `CancelReason::Inactivity`, which the
/// orchestrator classifies as a timeout rather than a user stop. Dropping
/// the watchdog disarms it.
pub struct InactivityWatchdog {
    deadline_tx: watch::Sender<Instant>,
    threshold: Duration,
    task: JoinHandle<()>,
}

impl InactivityWatchdog {
    pub fn spawn(signal: CancelSignal, threshold: Duration) -> Self {
        let (deadline_tx, mut deadline_rx) = watch::channel(Instant::now() + threshold);

        let task = tokio::spawn(async move {
            loop {
                let deadline = *deadline_rx.borrow_and_update();
                tokio::select! {
                    () = signal.cancelled() => break,
                    changed = deadline_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = time::sleep_until(deadline) => {
                        debug!(threshold = ?threshold, "inactivity threshold reached");
                        signal.cancel(CancelReason::Inactivity);
                        break;
                    }
                }
            }
        });

        Self { deadline_tx, threshold, task }
    }

    /// Push the deadline out to now + threshold. Called once per decoded
    /// event, not per chunk.
    pub fn rearm(&self) {
        let _ = self.deadline_tx.send(Instant::now() + self.threshold);
    }
}

impl Drop for InactivityWatchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_silence() {
        let signal = CancelSignal::new();
        let _watchdog = InactivityWatchdog::spawn(signal.clone(), Duration::from_secs(5));

        time::sleep(Duration::from_secs(6)).await;

        assert!(signal.is_cancelled());
        assert_eq!(signal.reason(), Some(CancelReason::Inactivity));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_defers_the_deadline() {
        let signal = CancelSignal::new();
        let watchdog = InactivityWatchdog::spawn(signal.clone(), Duration::from_secs(5));

        for _ in 0..3 {
            time::sleep(Duration::from_secs(4)).await;
            watchdog.rearm();
            assert!(!signal.is_cancelled());
        }

        time::sleep(Duration::from_secs(6)).await;
        assert!(signal.is_cancelled());
        assert_eq!(signal.reason(), Some(CancelReason::Inactivity));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_disarms() {
        let signal = CancelSignal::new();
        let watchdog = InactivityWatchdog::spawn(signal.clone(), Duration::from_secs(5));
        drop(watchdog);

        time::sleep(Duration::from_secs(10)).await;
        assert!(!signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn user_cancel_wins_over_later_expiry() {
        let signal = CancelSignal::new();
        let _watchdog = InactivityWatchdog::spawn(signal.clone(), Duration::from_secs(5));

        signal.cancel(CancelReason::UserStop);
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(signal.reason(), Some(CancelReason::UserStop));
    }
}
