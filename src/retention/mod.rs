//! Retention: transactions older than [RETENTION_DAYS] days are deleted on
//! start-up and then once a day.

mod schedule;
mod sweeper;

pub use schedule::{
    Clock, FixedClock, IntervalTicker, LocalClock, ManualTicker, SWEEP_INTERVAL, Ticker,
    run_sweeper,
};
pub use sweeper::{RETENTION_DAYS, SweepOutcome, SweepSummary, Sweeper, cutoff_date};
