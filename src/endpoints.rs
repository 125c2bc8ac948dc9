//! The API endpoints URIs.

/// The route for mirroring transactions.
///
/// `POST` appends a transaction, `GET` lists every bucket and `DELETE`
/// removes one transaction from a bucket.
pub const TRANSACTIONS_API: &str = "/api/transactions";
