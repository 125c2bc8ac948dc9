//! Defines the mirror endpoint for deleting a transaction.

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    transaction::{
        TransactionId, TransactionStore,
        core::{deserialize_iso_date, serialize_iso_date},
    },
};

/// The state needed to delete a transaction.
#[derive(Clone)]
pub struct DeleteTransactionState {
    /// The store that mirrored transactions are deleted from.
    pub transaction_store: TransactionStore,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// The error message sent when there is no bucket for the requested date.
pub const BUCKET_NOT_FOUND_MESSAGE: &str = "Transaction file not found";

/// The body of a delete request: which bucket to look in and which transaction to remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionRequest {
    /// The date of the bucket holding the transaction.
    #[serde(
        serialize_with = "serialize_iso_date",
        deserialize_with = "deserialize_iso_date"
    )]
    pub date: Date,
    /// The transaction to remove.
    pub transaction_id: TransactionId,
}

/// A route handler for deleting a transaction from its date bucket.
///
/// Responds with 404 if there is no bucket for the date. Deleting an ID that
/// is not in an existing bucket succeeds.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Json(request): Json<DeleteTransactionRequest>,
) -> Response {
    match state
        .transaction_store
        .remove_by_id(request.date, &request.transaction_id)
    {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Transaction deleted" })),
        )
            .into_response(),
        Err(Error::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": BUCKET_NOT_FOUND_MESSAGE })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(
                "Could not delete transaction {} on {}: {error}",
                request.transaction_id,
                request.date
            );
            error.into_response()
        }
    }
}
