//! Running the sweeper in the background: tickers, clocks and the sweep loop.

use std::{future::Future, sync::Arc, time::Duration};

use time::{Date, OffsetDateTime, UtcOffset};
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};

use crate::{
    Error,
    retention::{SweepOutcome, SweepSummary, Sweeper},
    timezone::get_local_offset,
};

/// How often the sweeper runs after the start-up sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// A source of sweep requests.
pub trait Ticker: Send {
    /// Wait for the next tick. Returns `false` once no more ticks will arrive.
    fn tick(&mut self) -> impl Future<Output = bool> + Send;
}

/// Ticks every `period`, starting one period from now.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker that fires every `period`.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { interval }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(SWEEP_INTERVAL)
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks whenever a message is sent on the paired sender, and stops once the
/// sender is dropped.
pub struct ManualTicker {
    receiver: mpsc::Receiver<()>,
}

impl ManualTicker {
    /// Create a ticker and the sender that drives it.
    pub fn new() -> (Self, mpsc::Sender<()>) {
        let (sender, receiver) = mpsc::channel(8);

        (Self { receiver }, sender)
    }
}

impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.receiver.recv().await.is_some()
    }
}

/// Tells the sweeper what day it is.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> OffsetDateTime;

    /// The current calendar date.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// The wall clock in a canonical time zone such as "Asia/Kolkata".
#[derive(Debug, Clone)]
pub struct LocalClock {
    timezone: String,
}

impl LocalClock {
    /// Create a clock for `timezone`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if `timezone` is not a known canonical time zone.
    pub fn new(timezone: &str) -> Result<Self, Error> {
        match get_local_offset(timezone) {
            Some(_) => Ok(Self {
                timezone: timezone.to_owned(),
            }),
            None => Err(Error::InvalidTimezone(timezone.to_owned())),
        }
    }
}

impl Clock for LocalClock {
    fn now(&self) -> OffsetDateTime {
        // The offset is looked up on every call so daylight saving changes are picked up.
        let offset = get_local_offset(&self.timezone).unwrap_or(UtcOffset::UTC);

        OffsetDateTime::now_utc().to_offset(offset)
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Sweep once immediately and then on every tick of `ticker`, until the ticker stops.
///
/// Every sweep that deletes something sends its summary on `summaries`.
/// Failed sweeps are logged and retried on the next tick.
pub async fn run_sweeper<T, C>(
    sweeper: Arc<Sweeper>,
    mut ticker: T,
    clock: C,
    summaries: mpsc::UnboundedSender<SweepSummary>,
) where
    T: Ticker,
    C: Clock,
{
    loop {
        let today = clock.today();
        let now = clock.now();
        let task_sweeper = sweeper.clone();

        match tokio::task::spawn_blocking(move || task_sweeper.sweep(today, now)).await {
            Ok(Ok(SweepOutcome::Swept(summary))) => {
                if summaries.send(summary).is_err() {
                    tracing::debug!("nobody is listening for sweep summaries");
                }
            }
            Ok(Ok(outcome)) => tracing::debug!("sweep finished: {outcome:?}"),
            Ok(Err(error)) => tracing::error!("Error during cleanup: {error}"),
            Err(error) => tracing::error!("sweep task failed: {error}"),
        }

        if !ticker.tick().await {
            tracing::info!("sweeper ticker stopped, exiting sweep loop");
            break;
        }
    }
}

#[cfg(test)]
mod schedule_tests {
    use std::{sync::Arc, time::Duration};

    use time::macros::{date, datetime};
    use tokio::sync::mpsc;

    use crate::{
        Error,
        config::{ConfigStore, MemberId},
        retention::{
            Clock, FixedClock, IntervalTicker, LocalClock, ManualTicker, Sweeper, Ticker,
            run_sweeper,
        },
        storage::MemoryStorage,
        transaction::{Transaction, TransactionStore},
    };

    #[test]
    fn local_clock_rejects_unknown_timezone() {
        assert_eq!(
            LocalClock::new("Nowhere/Special").unwrap_err(),
            Error::InvalidTimezone("Nowhere/Special".to_owned())
        );
    }

    #[test]
    fn local_clock_uses_zone_offset() {
        let clock = LocalClock::new("Asia/Kolkata").expect("Could not create clock");

        assert_eq!(clock.now().offset().whole_minutes(), 5 * 60 + 30);
    }

    #[test]
    fn fixed_clock_today_is_date_of_now() {
        let clock = FixedClock(datetime!(2026-03-15 23:30 UTC));

        assert_eq!(clock.today(), date!(2026 - 03 - 15));
    }

    #[tokio::test]
    async fn interval_ticker_ticks() {
        let mut ticker = IntervalTicker::new(Duration::from_millis(5));

        assert!(ticker.tick().await);
    }

    #[tokio::test]
    async fn run_sweeper_sweeps_at_start_and_on_each_tick() {
        let storage = Arc::new(MemoryStorage::new());
        let transactions = TransactionStore::new(storage.clone());
        let sweeper = Arc::new(Sweeper::new(
            transactions.clone(),
            ConfigStore::new(storage),
        ));
        let append_stale = |description: &str| {
            transactions
                .append(
                    Transaction::build(
                        MemberId::new("1"),
                        5.0,
                        date!(2026 - 01 - 01),
                        description,
                    )
                    .finalize(datetime!(2026-01-01 9:00 UTC))
                    .unwrap(),
                )
                .unwrap();
        };
        append_stale("Tea");
        let (ticker, tick) = ManualTicker::new();
        let (summary_sender, mut summaries) = mpsc::unbounded_channel();

        let handle = tokio::spawn(run_sweeper(
            sweeper,
            ticker,
            FixedClock(datetime!(2026-03-15 8:00 UTC)),
            summary_sender,
        ));

        let first = summaries.recv().await.expect("No summary after start-up sweep");
        assert_eq!(first.deleted_transaction_count, 1);

        append_stale("Coffee");
        append_stale("Milk");
        tick.send(()).await.unwrap();
        let second = summaries.recv().await.expect("No summary after tick");
        assert_eq!(second.deleted_transaction_count, 2);

        drop(tick);
        handle.await.expect("Sweeper task panicked");
        assert!(summaries.recv().await.is_none());
    }
}
