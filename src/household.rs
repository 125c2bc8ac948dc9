//! The household facade that front ends drive.

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    Error,
    config::{ConfigStore, MemberId},
    dashboard::{Dashboard, Snapshot, StorageStats, storage_stats},
    retention::Sweeper,
    storage::Storage,
    sync::SyncEvent,
    transaction::{Transaction, TransactionBuilder, TransactionId, TransactionStore},
};

/// A household's budget data: the transaction store and configuration
/// sharing one storage backend.
#[derive(Clone)]
pub struct Household {
    transactions: TransactionStore,
    config: ConfigStore,
}

impl Household {
    /// Open the household stored in `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            transactions: TransactionStore::new(storage.clone()),
            config: ConfigStore::new(storage),
        }
    }

    /// Publish transaction changes to `sender` for mirroring.
    pub fn with_sync(mut self, sender: UnboundedSender<SyncEvent>) -> Self {
        self.transactions = self.transactions.with_sync(sender);
        self
    }

    /// The transaction store.
    pub fn transactions(&self) -> &TransactionStore {
        &self.transactions
    }

    /// The configuration store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Finalize `builder` at `now` and save the transaction.
    ///
    /// # Errors
    /// Returns an [Error::UnknownMember] if the transaction's member is not
    /// in the configuration, or a validation error from
    /// [TransactionBuilder::finalize].
    pub fn add_transaction(
        &self,
        builder: TransactionBuilder,
        now: OffsetDateTime,
    ) -> Result<Transaction, Error> {
        let config = self.config.load()?;
        if config.member(&builder.member_id).is_none() {
            return Err(Error::UnknownMember(builder.member_id.to_string()));
        }

        let transaction = builder.finalize(now)?;
        self.transactions.append(transaction.clone())?;
        tracing::debug!(
            "added transaction {} of {} on {}",
            transaction.id,
            transaction.amount,
            transaction.date
        );

        Ok(transaction)
    }

    /// Delete the transaction `id` wherever it is and return it.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no bucket holds the transaction.
    pub fn delete_transaction(&self, id: &TransactionId) -> Result<Transaction, Error> {
        let transaction = self.transactions.find(id)?.ok_or(Error::NotFound)?;
        self.transactions.remove_by_id(transaction.date, id)?;

        Ok(transaction)
    }

    /// Remove a member along with all of their transactions.
    ///
    /// Returns the number of transactions deleted.
    pub fn remove_member(&self, id: &MemberId) -> Result<usize, Error> {
        self.config.remove_member(id, &self.transactions)
    }

    /// Read the configuration and every transaction.
    pub fn snapshot(&self) -> Result<Snapshot, Error> {
        Ok(Snapshot {
            config: self.config.load()?,
            transactions: self.transactions.scan_all()?,
        })
    }

    /// Build the dashboard from a fresh snapshot.
    pub fn dashboard(&self) -> Result<Dashboard, Error> {
        Ok(Dashboard::new(&self.snapshot()?))
    }

    /// Summarize what is held in storage.
    pub fn storage_stats(&self) -> Result<StorageStats, Error> {
        let dates = self.transactions.all_dates()?;
        let transactions = self.transactions.scan_all()?;

        Ok(storage_stats(&dates, &transactions))
    }

    /// A retention sweeper for this household.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(self.transactions.clone(), self.config.clone())
    }

    /// Delete every bucket and reset the configuration to its default.
    ///
    /// Returns the number of buckets deleted. Nothing is sent to the mirror.
    pub fn clear_all(&self, now: OffsetDateTime) -> Result<usize, Error> {
        let deleted = self.transactions.clear()?;
        self.config.reset(now)?;
        tracing::info!("cleared all data, deleted {deleted} buckets");

        Ok(deleted)
    }
}

#[cfg(test)]
mod household_tests {
    use std::sync::Arc;

    use time::macros::{date, datetime};
    use tokio::sync::mpsc;

    use crate::{
        Error, Household,
        config::MemberId,
        storage::MemoryStorage,
        sync::SyncEvent,
        transaction::{Category, Transaction, TransactionId},
    };

    fn get_test_household() -> Household {
        Household::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn add_transaction_requires_known_member() {
        let household = get_test_household();

        let result = household.add_transaction(
            Transaction::build(MemberId::new("ghost"), 5.0, date!(2026 - 02 - 07), "Tea"),
            datetime!(2026-02-07 10:00 UTC),
        );

        assert_eq!(result, Err(Error::UnknownMember("ghost".to_owned())));
    }

    #[test]
    fn add_transaction_saves_to_bucket() {
        let household = get_test_household();
        let asha = household.config().add_member("Asha").unwrap();

        let transaction = household
            .add_transaction(
                Transaction::build(asha.id, 120.0, date!(2026 - 02 - 07), "Medicine")
                    .category(Category::Healthcare),
                datetime!(2026-02-07 10:00 UTC),
            )
            .expect("Could not add transaction");

        assert_eq!(household.transactions().scan_all(), Ok(vec![transaction]));
    }

    #[test]
    fn delete_transaction_finds_bucket_by_id() {
        let household = get_test_household();
        let asha = household.config().add_member("Asha").unwrap();
        let transaction = household
            .add_transaction(
                Transaction::build(asha.id, 120.0, date!(2026 - 02 - 07), "Medicine"),
                datetime!(2026-02-07 10:00 UTC),
            )
            .unwrap();

        let deleted = household.delete_transaction(&transaction.id);

        assert_eq!(deleted, Ok(transaction));
        assert!(household.transactions().all_dates().unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_transaction_is_not_found() {
        let household = get_test_household();

        assert_eq!(
            household.delete_transaction(&TransactionId::new("nope")),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn storage_stats_counts_buckets() {
        let household = get_test_household();
        let asha = household.config().add_member("Asha").unwrap();
        let now = datetime!(2026-02-09 10:00 UTC);
        for day in [date!(2026 - 02 - 07), date!(2026 - 02 - 07), date!(2026 - 02 - 09)] {
            household
                .add_transaction(Transaction::build(asha.id.clone(), 1.0, day, "Chai"), now)
                .unwrap();
        }

        let stats = household.storage_stats().unwrap();

        assert_eq!(stats.bucket_count, 2);
        assert_eq!(stats.transaction_count, 3);
        assert_eq!(stats.oldest_date, Some(date!(2026 - 02 - 07)));
        assert_eq!(stats.newest_date, Some(date!(2026 - 02 - 09)));
    }

    #[test]
    fn clear_all_resets_everything() {
        let household = get_test_household();
        let asha = household.config().add_member("Asha").unwrap();
        household.config().set_budget(500.0).unwrap();
        household
            .add_transaction(
                Transaction::build(asha.id, 1.0, date!(2026 - 02 - 07), "Chai"),
                datetime!(2026-02-07 10:00 UTC),
            )
            .unwrap();
        let now = datetime!(2026-02-08 10:00 UTC);

        let deleted = household.clear_all(now);

        assert_eq!(deleted, Ok(1));
        let config = household.config().load().unwrap();
        assert_eq!(config.budget, 0.0);
        assert!(config.members.is_empty());
        assert_eq!(config.last_cleanup, now);
        assert_eq!(household.transactions().scan_all(), Ok(vec![]));
    }

    #[test]
    fn with_sync_publishes_adds_and_deletes() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let household = get_test_household().with_sync(sender);
        let asha = household.config().add_member("Asha").unwrap();
        let transaction = household
            .add_transaction(
                Transaction::build(asha.id, 1.0, date!(2026 - 02 - 07), "Chai"),
                datetime!(2026-02-07 10:00 UTC),
            )
            .unwrap();
        household.delete_transaction(&transaction.id).unwrap();

        assert_eq!(
            receiver.try_recv(),
            Ok(SyncEvent::Append(transaction.clone()))
        );
        assert_eq!(
            receiver.try_recv(),
            Ok(SyncEvent::Remove {
                date: transaction.date,
                transaction_id: transaction.id,
            })
        );
    }
}
