//! The date-bucketed transaction store.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use time::Date;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    Error,
    config::MemberId,
    storage::Storage,
    sync::SyncEvent,
    transaction::{
        DateBucket, Transaction, TransactionId,
        bucket::{bucket_key, date_from_key},
    },
};

/// Stores transactions in one record per calendar date.
///
/// Buckets are created on the first append for a date and deleted as soon as
/// their last transaction is removed. When a sync sender is attached, every
/// successful append or removal is also published as a [SyncEvent]; a closed
/// channel never fails the local operation.
#[derive(Clone)]
pub struct TransactionStore {
    storage: Arc<dyn Storage>,
    sync: Option<UnboundedSender<SyncEvent>>,
}

impl TransactionStore {
    /// Create a store on top of `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            sync: None,
        }
    }

    /// Publish mutations to `sender` for mirroring.
    pub fn with_sync(mut self, sender: UnboundedSender<SyncEvent>) -> Self {
        self.sync = Some(sender);
        self
    }

    /// Add `transaction` to the bucket for its date, creating the bucket if needed.
    ///
    /// IDs are not checked for duplicates; the caller must supply a unique ID.
    ///
    /// # Errors
    /// Returns an [Error::CorruptBucket] if the existing bucket cannot be read,
    /// or an [Error::StorageError] if it cannot be written.
    pub fn append(&self, transaction: Transaction) -> Result<(), Error> {
        let mut bucket = self
            .get_bucket(transaction.date)?
            .unwrap_or_else(|| DateBucket::new(transaction.date));

        bucket.transactions.push(transaction.clone());
        self.storage.set(&bucket.key(), &bucket.to_json()?)?;

        tracing::debug!(
            "appended transaction {} to {}",
            transaction.id,
            bucket.key()
        );
        self.publish(SyncEvent::Append(transaction));

        Ok(())
    }

    /// Add `transaction` unless its bucket already holds a transaction with the same ID.
    ///
    /// Returns whether the transaction was added. Mirrors use this so that a
    /// retried append is not stored twice.
    ///
    /// # Errors
    /// Same as [TransactionStore::append].
    pub fn append_if_absent(&self, transaction: Transaction) -> Result<bool, Error> {
        let already_stored = self.get_bucket(transaction.date)?.is_some_and(|bucket| {
            bucket
                .transactions
                .iter()
                .any(|stored| stored.id == transaction.id)
        });

        if already_stored {
            tracing::debug!("transaction {} is already stored", transaction.id);
            return Ok(false);
        }

        self.append(transaction)?;

        Ok(true)
    }

    /// Remove the transaction `transaction_id` from the bucket for `date`.
    ///
    /// Removing an ID that is not in the bucket is a successful no-op. The
    /// bucket is deleted if it ends up empty.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if there is no bucket for `date`.
    pub fn remove_by_id(&self, date: Date, transaction_id: &TransactionId) -> Result<(), Error> {
        let mut bucket = self.get_bucket(date)?.ok_or(Error::NotFound)?;

        let original_len = bucket.len();
        bucket
            .transactions
            .retain(|transaction| &transaction.id != transaction_id);

        if bucket.len() != original_len {
            self.write_bucket(&bucket)?;
            tracing::debug!("removed transaction {transaction_id} from {}", bucket.key());
        }

        self.publish(SyncEvent::Remove {
            date,
            transaction_id: transaction_id.clone(),
        });

        Ok(())
    }

    /// Remove every transaction logged by `member_id` from every bucket.
    ///
    /// Returns how many transactions were removed. Corrupt buckets are skipped.
    pub fn remove_by_member(&self, member_id: &MemberId) -> Result<usize, Error> {
        let mut removed_count = 0;

        for (date, mut bucket) in self.all_buckets()? {
            let (removed, kept): (Vec<_>, Vec<_>) = bucket
                .transactions
                .into_iter()
                .partition(|transaction| &transaction.member_id == member_id);

            if removed.is_empty() {
                continue;
            }

            bucket.transactions = kept;
            self.write_bucket(&bucket)?;
            removed_count += removed.len();

            for transaction in removed {
                self.publish(SyncEvent::Remove {
                    date,
                    transaction_id: transaction.id,
                });
            }
        }

        tracing::debug!("removed {removed_count} transactions belonging to member {member_id}");

        Ok(removed_count)
    }

    /// The dates that have a persisted bucket, in ascending order.
    ///
    /// Bucket keys with a malformed date are skipped with a warning.
    pub fn all_dates(&self) -> Result<BTreeSet<Date>, Error> {
        let mut dates = BTreeSet::new();

        for key in self.storage.keys()? {
            match date_from_key(&key) {
                Some(Ok(date)) => {
                    dates.insert(date);
                }
                Some(Err(error)) => tracing::warn!("skipping bucket key {key}: {error}"),
                None => {}
            }
        }

        Ok(dates)
    }

    /// Every transaction in every readable bucket, in no particular order.
    pub fn scan_all(&self) -> Result<Vec<Transaction>, Error> {
        Ok(self
            .all_buckets()?
            .into_values()
            .flat_map(|bucket| bucket.transactions)
            .collect())
    }

    /// Get the bucket for `date`, or `None` if there is none.
    ///
    /// # Errors
    /// Returns an [Error::CorruptBucket] if the bucket cannot be parsed.
    pub fn get_bucket(&self, date: Date) -> Result<Option<DateBucket>, Error> {
        self.storage
            .get(&bucket_key(date))?
            .map(|json| DateBucket::from_json(date, &json))
            .transpose()
    }

    /// Every readable bucket keyed by date. Corrupt buckets are logged and skipped.
    pub fn all_buckets(&self) -> Result<BTreeMap<Date, DateBucket>, Error> {
        let mut buckets = BTreeMap::new();

        for date in self.all_dates()? {
            match self.get_bucket(date) {
                Ok(Some(bucket)) => {
                    buckets.insert(date, bucket);
                }
                Ok(None) => {}
                Err(error @ Error::CorruptBucket { .. }) => {
                    tracing::warn!("skipping bucket: {error}");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(buckets)
    }

    /// Find a transaction by its ID alone.
    pub fn find(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>, Error> {
        Ok(self
            .scan_all()?
            .into_iter()
            .find(|transaction| &transaction.id == transaction_id))
    }

    /// Delete the whole bucket for `date` and return how many transactions it held.
    ///
    /// A corrupt bucket is still deleted and counts as holding no transactions.
    /// Deleting a missing bucket returns zero.
    pub fn delete_bucket(&self, date: Date) -> Result<usize, Error> {
        let transaction_count = match self.get_bucket(date) {
            Ok(bucket) => bucket.map_or(0, |bucket| bucket.len()),
            Err(error @ Error::CorruptBucket { .. }) => {
                tracing::warn!("deleting unreadable bucket: {error}");
                0
            }
            Err(error) => return Err(error),
        };

        self.storage.delete(&bucket_key(date))?;

        Ok(transaction_count)
    }

    /// Delete every bucket and return how many were deleted.
    pub fn clear(&self) -> Result<usize, Error> {
        let dates = self.all_dates()?;

        for date in &dates {
            self.storage.delete(&bucket_key(*date))?;
        }

        Ok(dates.len())
    }

    /// Persist `bucket`, or delete it when it has become empty.
    fn write_bucket(&self, bucket: &DateBucket) -> Result<(), Error> {
        if bucket.is_empty() {
            tracing::debug!("deleting empty bucket {}", bucket.key());
            self.storage.delete(&bucket.key())
        } else {
            self.storage.set(&bucket.key(), &bucket.to_json()?)
        }
    }

    fn publish(&self, event: SyncEvent) {
        if let Some(sender) = &self.sync
            && let Err(error) = sender.send(event)
        {
            tracing::warn!("sync worker is gone, dropping event: {:?}", error.0);
        }
    }
}
