//! Confirmation polling.
//!
//! Polls `/tx/{hash}` on a fixed interval until the ledger reports the
//! transaction confirmed or the deadline passes. Poll failures only mean
//! "not confirmed yet". Giving up locally never affects the submitted
//! transaction.

use std::time::Duration;

use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::RpcClient;
use crate::blockchain::types::{TxStatus, WaitOutcome};
use crate::lifecycle::shutdown::{cancelled, Shutdown};
use crate::observability::metrics;

/// Shortest allowed gap between status polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct ConfirmationWaiter {
    client: RpcClient,
    poll_interval: Duration,
}

impl ConfirmationWaiter {
    /// `poll_interval` is raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn new(client: RpcClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait up to `deadline` for `tx_hash` to confirm. Never fails.
    pub async fn wait(&self, tx_hash: &str, deadline: Duration) -> bool {
        let confirmed = timeout(deadline, self.poll_until_confirmed(tx_hash))
            .await
            .is_ok();
        record(tx_hash, if confirmed { WaitOutcome::Confirmed } else { WaitOutcome::TimedOut(deadline) });
        confirmed
    }

    /// Like [`wait`](Self::wait), but stops early when `shutdown` fires,
    /// including a shutdown triggered before the wait began.
    pub async fn wait_cancellable(
        &self,
        tx_hash: &str,
        deadline: Duration,
        shutdown: &Shutdown,
    ) -> WaitOutcome {
        // Subscribe before reading the flag; a trigger in between is still received.
        let mut rx = shutdown.subscribe();
        let outcome = if shutdown.is_triggered() {
            WaitOutcome::Cancelled
        } else {
            tokio::select! {
                result = timeout(deadline, self.poll_until_confirmed(tx_hash)) => match result {
                    Ok(()) => WaitOutcome::Confirmed,
                    Err(_) => WaitOutcome::TimedOut(deadline),
                },
                _ = cancelled(&mut rx) => WaitOutcome::Cancelled,
            }
        };
        record(tx_hash, outcome);
        outcome
    }

    async fn poll_until_confirmed(&self, tx_hash: &str) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.client.tx_status(tx_hash).await {
                Ok(TxStatus::Confirmed) => return,
                Ok(status) => {
                    tracing::debug!(tx_hash, status = ?status, "Transaction not confirmed yet");
                }
                Err(e) => {
                    tracing::debug!(tx_hash, error = %e, "Status poll failed; will poll again");
                }
            }
        }
    }
}

fn record(tx_hash: &str, outcome: WaitOutcome) {
    match outcome {
        WaitOutcome::Confirmed => {
            metrics::record_confirmation("confirmed");
            tracing::info!(tx_hash, "Transaction confirmed");
        }
        WaitOutcome::TimedOut(deadline) => {
            metrics::record_confirmation("timeout");
            tracing::info!(
                tx_hash,
                deadline_secs = deadline.as_secs(),
                "Transaction not confirmed within deadline"
            );
        }
        WaitOutcome::Cancelled => {
            metrics::record_confirmation("cancelled");
            tracing::info!(tx_hash, "Stopped waiting for confirmation");
        }
    }
}
