//! Defines the mirror endpoint for saving a transaction.

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    transaction::{Transaction, TransactionStore},
};

/// The state needed to save a transaction.
#[derive(Clone)]
pub struct CreateTransactionState {
    /// The store that mirrored transactions are written to.
    pub transaction_store: TransactionStore,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// A route handler that appends a transaction to the bucket for its date,
/// creating the bucket if it does not exist yet.
///
/// Saving a transaction whose ID is already in the bucket succeeds without
/// storing it again, so clients can safely retry.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(transaction): Json<Transaction>,
) -> Response {
    if let Err(error) = transaction.validate() {
        tracing::debug!("rejecting invalid transaction {}: {error}", transaction.id);
        return error.into_response();
    }

    let transaction_id = transaction.id.clone();

    match state.transaction_store.append_if_absent(transaction) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Transaction saved" })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not save transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
