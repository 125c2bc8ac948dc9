//! Defines the mirror endpoint that lists every bucket.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    transaction::{DateBucket, TransactionStore},
};

/// The state needed to list mirrored transactions.
#[derive(Clone)]
pub struct GetTransactionsState {
    /// The store holding the mirrored transactions.
    pub transaction_store: TransactionStore,
}

impl FromRef<AppState> for GetTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// A route handler that returns every bucket keyed by its `yyyy-mm-dd` date.
///
/// Used by export tooling, the local store never reads from the mirror.
pub async fn get_transactions_endpoint(State(state): State<GetTransactionsState>) -> Response {
    match state.transaction_store.all_buckets() {
        Ok(buckets) => {
            let buckets: BTreeMap<String, DateBucket> = buckets
                .into_iter()
                .map(|(date, bucket)| (date.to_string(), bucket))
                .collect();

            Json(buckets).into_response()
        }
        Err(error) => {
            tracing::error!("Could not list mirrored transactions: {error}");
            error.into_response()
        }
    }
}
