//! Implements a struct that holds the state of the mirror server.

use std::sync::Arc;

use crate::{storage::Storage, transaction::TransactionStore};

/// The state of the mirror server.
#[derive(Clone)]
pub struct AppState {
    /// The mirrored transactions.
    ///
    /// This store never publishes sync events, the mirror is the end of the line.
    pub transaction_store: TransactionStore,
}

impl AppState {
    /// Create a new [AppState] that keeps mirrored buckets in `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            transaction_store: TransactionStore::new(storage),
        }
    }
}
