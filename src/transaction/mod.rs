//! Transaction management for the budget tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - The per-date buckets they are persisted in and the store that manages them
//! - The mirror endpoints that accept copies of local writes over HTTP

mod bucket;
mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod get_transactions_endpoint;
mod store;

pub use bucket::{BUCKET_KEY_PREFIX, DateBucket, bucket_key};
pub use core::{Category, Transaction, TransactionBuilder, TransactionId, parse_date};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::{
    BUCKET_NOT_FOUND_MESSAGE, DeleteTransactionRequest, delete_transaction_endpoint,
};
pub use get_transactions_endpoint::get_transactions_endpoint;
pub use store::TransactionStore;
