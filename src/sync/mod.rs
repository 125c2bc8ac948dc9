//! Mirroring of local changes.
//!
//! The [crate::TransactionStore] publishes a [SyncEvent] for every append and
//! removal. A [SyncWorker] drains those events and applies them to a
//! [Mirror], retrying failures in the background so local operations never
//! wait on, or fail because of, the mirror.

mod event;
mod mirror;
mod worker;

pub use event::SyncEvent;
pub use mirror::{HttpMirror, Mirror, StorageMirror};
pub use worker::{RetryPolicy, SyncReport, SyncWorker};
