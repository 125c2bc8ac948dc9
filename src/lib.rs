//! Household Budget is a shared expense tracker for a household.
//!
//! Members log expenses which are grouped into one bucket per calendar date
//! and persisted through a pluggable [Storage] backend. On top of the store
//! sit the aggregations used by the dashboard, a retention sweeper that
//! drops buckets older than 35 days, and an optional mirror that receives a
//! copy of every write over HTTP.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod config;
mod currency;
mod dashboard;
mod endpoints;
mod export;
mod household;
mod id;
mod logging;
mod retention;
mod routing;
mod storage;
mod sync;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use config::{
    CONFIG_KEY, ConfigStore, Configuration, Member, MemberId, MemberName, UNKNOWN_MEMBER_NAME,
};
pub use currency::format_currency;
pub use dashboard::{
    BudgetStatus, CategorySpend, Dashboard, DashboardRow, MemberSpend, Snapshot, StorageStats,
    Totals, count_label, sorted_transactions, spend_by_category, spend_by_member, storage_stats,
    totals,
};
pub use endpoints::TRANSACTIONS_API;
pub use export::{Export, export, export_file_name, import, import_replacing};
pub use household::Household;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware, setup_logging};
pub use retention::{
    Clock, FixedClock, IntervalTicker, LocalClock, ManualTicker, RETENTION_DAYS, SWEEP_INTERVAL,
    SweepOutcome, SweepSummary, Sweeper, Ticker, cutoff_date, run_sweeper,
};
pub use routing::build_router;
pub use storage::{DirectoryStorage, MemoryStorage, SqliteStorage, Storage};
pub use sync::{HttpMirror, Mirror, RetryPolicy, StorageMirror, SyncEvent, SyncReport, SyncWorker};
pub use timezone::get_local_offset;
pub use transaction::{
    BUCKET_KEY_PREFIX, Category, DateBucket, DeleteTransactionRequest, Transaction,
    TransactionBuilder, TransactionId, TransactionStore, bucket_key, parse_date,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For the transaction store this means the date bucket does not exist.
    /// A missing transaction ID inside an existing bucket is not an error.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A member with the same name (ignoring case) already exists.
    #[error("the member \"{0}\" already exists")]
    DuplicateMemberName(String),

    /// An empty string was used to create a member name.
    #[error("member name cannot be empty")]
    EmptyMemberName,

    /// The transaction refers to a member that is not in the configuration.
    #[error("no member with the ID \"{0}\"")]
    UnknownMember(String),

    /// The budget must be a finite, non-negative number.
    #[error("{0} is not a valid budget, the budget must be a non-negative number")]
    InvalidBudget(f64),

    /// Transaction amounts must be finite, non-negative numbers.
    #[error("{0} is not a valid amount, the amount must be a non-negative number")]
    InvalidAmount(f64),

    /// A required transaction field was empty.
    #[error("the field \"{0}\" cannot be empty")]
    EmptyField(&'static str),

    /// A date string could not be parsed as `yyyy-mm-dd`.
    #[error("could not parse \"{0}\" as a date, expected yyyy-mm-dd")]
    InvalidDateFormat(String),

    /// A persisted date bucket could not be parsed.
    ///
    /// Full scans skip corrupt buckets, so this error is only returned by
    /// operations that target a single bucket.
    #[error("the bucket \"{key}\" is corrupt: {reason}")]
    CorruptBucket {
        /// The storage key of the bucket.
        key: String,
        /// Why the bucket could not be read.
        reason: String,
    },

    /// The persisted configuration could not be parsed.
    #[error("the budget configuration is corrupt: {0}")]
    CorruptConfig(String),

    /// The storage backend failed to read or write a record.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A storage key contained characters that cannot be persisted.
    #[error("invalid storage key \"{0}\"")]
    InvalidKey(String),

    /// Could not acquire a lock guarding shared state.
    #[error("could not acquire the {0} lock")]
    LockError(&'static str),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The mirror rejected a request or could not be reached.
    #[error("mirror error: {0}")]
    MirrorError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::StorageError(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::StorageError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::MirrorError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidAmount(_)
            | Error::EmptyField(_)
            | Error::InvalidDateFormat(_)
            | Error::InvalidKey(_) => StatusCode::BAD_REQUEST,
            ref error => {
                tracing::error!("An unexpected error occurred: {}", error);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
