//! Applies sync events to a mirror in the background.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::sync::{Mirror, SyncEvent};

/// How often, and how patiently, a failed event is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The total number of attempts per event, including the first.
    pub max_attempts: u32,
    /// The wait before the first retry. Each further retry waits twice as long.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// The wait after failed attempt number `attempt` (starting at 1).
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// What happened to the events a [SyncWorker] received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Events the mirror accepted.
    pub delivered: usize,
    /// Events given up on after exhausting the retry policy.
    pub dropped: usize,
}

/// Copies every [SyncEvent] it receives to a [Mirror], in order.
pub struct SyncWorker<M> {
    mirror: M,
    retry: RetryPolicy,
}

impl<M: Mirror> SyncWorker<M> {
    /// Create a worker with the default [RetryPolicy].
    pub fn new(mirror: M) -> Self {
        Self {
            mirror,
            retry: RetryPolicy::default(),
        }
    }

    /// Use `retry` instead of the default retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Apply events until every sender has been dropped and the channel is drained.
    pub async fn run(&self, mut receiver: UnboundedReceiver<SyncEvent>) -> SyncReport {
        let mut report = SyncReport::default();

        while let Some(event) = receiver.recv().await {
            if self.deliver(&event).await {
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }
        }

        tracing::debug!(
            "sync worker finished: {} delivered, {} dropped",
            report.delivered,
            report.dropped
        );

        report
    }

    async fn deliver(&self, event: &SyncEvent) -> bool {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.mirror.apply(event).await {
                Ok(()) => {
                    tracing::debug!("mirrored {}", event.describe());
                    return true;
                }
                Err(error) if attempt < max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    tracing::warn!(
                        "could not mirror {} (attempt {attempt} of {max_attempts}), retrying in {backoff:?}: {error}",
                        event.describe()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => {
                    tracing::error!(
                        "giving up on mirroring {} after {max_attempts} attempts: {error}",
                        event.describe()
                    );
                }
            }
        }

        false
    }
}
