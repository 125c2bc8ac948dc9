//! Deletes date buckets that have aged out of the retention window.

use std::sync::Mutex;

use time::{Date, Duration, OffsetDateTime};

use crate::{Error, config::ConfigStore, transaction::TransactionStore};

/// How many days of transactions are kept.
pub const RETENTION_DAYS: i64 = 35;

/// The first date that is still kept when sweeping on `today`.
///
/// Buckets dated strictly before the cutoff are stale.
pub fn cutoff_date(today: Date) -> Date {
    today
        .checked_sub(Duration::days(RETENTION_DAYS))
        .unwrap_or(Date::MIN)
}

/// What a completed sweep removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// The number of date buckets deleted.
    pub deleted_bucket_count: usize,
    /// The number of transactions held by the deleted buckets.
    pub deleted_transaction_count: usize,
    /// Buckets dated before this were deleted.
    pub cutoff: Date,
}

/// The result of asking the [Sweeper] to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was running. The request was recorded and will be run
    /// once that sweep finishes.
    Busy,
    /// No bucket was older than the cutoff, nothing was changed.
    NothingStale,
    /// Stale buckets were deleted and the cleanup time recorded.
    Swept(SweepSummary),
}

impl SweepOutcome {
    /// Merge the outcome of a follow-up sweep into this one.
    fn and_then(self, other: SweepOutcome) -> SweepOutcome {
        match (self, other) {
            (SweepOutcome::Swept(first), SweepOutcome::Swept(second)) => {
                SweepOutcome::Swept(SweepSummary {
                    deleted_bucket_count: first.deleted_bucket_count
                        + second.deleted_bucket_count,
                    deleted_transaction_count: first.deleted_transaction_count
                        + second.deleted_transaction_count,
                    cutoff: second.cutoff,
                })
            }
            (SweepOutcome::Swept(first), _) => SweepOutcome::Swept(first),
            (_, other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepState {
    Idle,
    Sweeping,
}

#[derive(Debug)]
struct SweepGuard {
    state: SweepState,
    /// Set when a sweep is requested while another one is running.
    pending: bool,
}

/// Runs the retention cleanup and guarantees that sweeps never overlap.
pub struct Sweeper {
    transactions: TransactionStore,
    config: ConfigStore,
    guard: Mutex<SweepGuard>,
}

impl Sweeper {
    /// Create a sweeper over the given stores.
    pub fn new(transactions: TransactionStore, config: ConfigStore) -> Self {
        Self {
            transactions,
            config,
            guard: Mutex::new(SweepGuard {
                state: SweepState::Idle,
                pending: false,
            }),
        }
    }

    /// Delete every bucket dated before [cutoff_date] of `today` and record
    /// `now` as the last cleanup time.
    ///
    /// If a sweep is already in progress this returns [SweepOutcome::Busy]
    /// straight away; any number of such requests collapse into a single
    /// follow-up sweep that the running call performs before returning.
    /// Deletions made here are not published to the mirror.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written. The sweeper
    /// is idle again afterwards.
    pub fn sweep(&self, today: Date, now: OffsetDateTime) -> Result<SweepOutcome, Error> {
        {
            let mut guard = self.lock()?;
            if guard.state == SweepState::Sweeping {
                tracing::debug!("sweep already running, queueing another");
                guard.pending = true;
                return Ok(SweepOutcome::Busy);
            }
            guard.state = SweepState::Sweeping;
        }

        let mut result = self.sweep_once(today, now);

        loop {
            let mut guard = self.lock()?;

            if guard.pending && result.is_ok() {
                guard.pending = false;
                drop(guard);

                tracing::debug!("running queued sweep");
                result = match (result, self.sweep_once(today, now)) {
                    (Ok(first), Ok(second)) => Ok(first.and_then(second)),
                    (_, Err(error)) | (Err(error), _) => Err(error),
                };
            } else {
                guard.state = SweepState::Idle;
                guard.pending = false;
                break;
            }
        }

        result
    }

    fn sweep_once(&self, today: Date, now: OffsetDateTime) -> Result<SweepOutcome, Error> {
        let cutoff = cutoff_date(today);
        let stale_dates: Vec<Date> = self
            .transactions
            .all_dates()?
            .range(..cutoff)
            .copied()
            .collect();

        if stale_dates.is_empty() {
            tracing::debug!("no buckets older than {cutoff}");
            return Ok(SweepOutcome::NothingStale);
        }

        let mut deleted_transaction_count = 0;
        for date in &stale_dates {
            deleted_transaction_count += self.transactions.delete_bucket(*date)?;
            tracing::debug!("deleted stale bucket for {date}");
        }

        self.config.record_cleanup(now)?;

        let summary = SweepSummary {
            deleted_bucket_count: stale_dates.len(),
            deleted_transaction_count,
            cutoff,
        };
        tracing::info!(
            "Cleanup complete: deleted {} buckets containing {} transactions older than {} days",
            summary.deleted_bucket_count,
            summary.deleted_transaction_count,
            RETENTION_DAYS
        );

        Ok(SweepOutcome::Swept(summary))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SweepGuard>, Error> {
        self.guard
            .lock()
            .map_err(|_| Error::LockError("sweeper state"))
    }
}
