//! The per-date record that groups transactions in storage.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    transaction::{
        Transaction,
        core::{deserialize_iso_date, parse_date, serialize_iso_date},
    },
};

/// Every bucket key starts with this prefix followed by the `yyyy-mm-dd` date.
pub const BUCKET_KEY_PREFIX: &str = "transactions_";

/// The storage key for the bucket holding transactions on `date`.
pub fn bucket_key(date: Date) -> String {
    format!("{BUCKET_KEY_PREFIX}{date}")
}

/// Extract the date from a bucket key.
///
/// Returns `None` for keys that do not belong to a bucket, and an error for
/// bucket keys whose date is malformed.
pub(crate) fn date_from_key(key: &str) -> Option<Result<Date, Error>> {
    key.strip_prefix(BUCKET_KEY_PREFIX).map(parse_date)
}

/// The transactions logged for one calendar date.
///
/// A bucket is never persisted empty. Every transaction in `transactions` has
/// the same date as the bucket; stored records that break this, or fail
/// validation, are held back from readers but written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateBucket {
    /// The date shared by every transaction in the bucket.
    #[serde(
        serialize_with = "serialize_iso_date",
        deserialize_with = "deserialize_iso_date"
    )]
    pub date: Date,
    /// The transactions in the order they were added.
    pub transactions: Vec<Transaction>,
    #[serde(skip)]
    held_back: Vec<Transaction>,
}

impl DateBucket {
    /// Create an empty bucket for `date`.
    pub fn new(date: Date) -> Self {
        Self {
            date,
            transactions: Vec::new(),
            held_back: Vec::new(),
        }
    }

    /// Parse the persisted JSON of the bucket stored under `date`.
    ///
    /// Transactions that fail validation or belong to another date are left out
    /// of `transactions` with a warning rather than failing the whole bucket.
    /// They are kept with the bucket and persisted again by [DateBucket::to_json].
    ///
    /// # Errors
    /// Returns an [Error::CorruptBucket] if `json` is not a bucket at all.
    pub fn from_json(date: Date, json: &str) -> Result<Self, Error> {
        let mut bucket: DateBucket =
            serde_json::from_str(json).map_err(|error| Error::CorruptBucket {
                key: bucket_key(date),
                reason: error.to_string(),
            })?;

        if bucket.date != date {
            tracing::warn!(
                "bucket {} claims to hold transactions for {}, using the key's date",
                bucket_key(date),
                bucket.date
            );
            bucket.date = date;
        }

        let (transactions, held_back): (Vec<_>, Vec<_>) = bucket
            .transactions
            .into_iter()
            .partition(|transaction: &Transaction| {
                if transaction.date != date {
                    tracing::warn!(
                        "ignoring transaction {} dated {} in bucket {}",
                        transaction.id,
                        transaction.date,
                        bucket_key(date)
                    );
                    return false;
                }

                if let Err(error) = transaction.validate() {
                    tracing::warn!(
                        "ignoring invalid transaction {} in bucket {}: {error}",
                        transaction.id,
                        bucket_key(date)
                    );
                    return false;
                }

                true
            });
        bucket.transactions = transactions;
        bucket.held_back = held_back;

        Ok(bucket)
    }

    /// Serialize the bucket the way it is persisted (pretty-printed JSON).
    ///
    /// Records held back when the bucket was loaded are written after the
    /// readable transactions.
    pub fn to_json(&self) -> Result<String, Error> {
        if self.held_back.is_empty() {
            return Ok(serde_json::to_string_pretty(self)?);
        }

        let mut persisted = self.clone();
        persisted.transactions.extend(self.held_back.iter().cloned());

        Ok(serde_json::to_string_pretty(&persisted)?)
    }

    /// The storage key for this bucket.
    pub fn key(&self) -> String {
        bucket_key(self.date)
    }

    /// Whether the bucket holds no records at all and must not be persisted.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.held_back.is_empty()
    }

    /// The number of readable transactions in the bucket.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }
}
