//! Whole-household JSON backups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, Household,
    config::Configuration,
    transaction::{DateBucket, Transaction, parse_date},
};

/// A backup of the configuration and every bucket, keyed by `yyyy-mm-dd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    /// The household configuration.
    pub config: Configuration,
    /// Every bucket keyed by its date.
    pub transactions_by_date: BTreeMap<String, DateBucket>,
}

impl Export {
    /// Serialize the backup as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a backup produced by [Export::to_json].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Take a backup of `household`.
///
/// Corrupt buckets are left out of the backup.
pub fn export(household: &Household) -> Result<Export, Error> {
    let transactions_by_date = household
        .transactions()
        .all_buckets()?
        .into_iter()
        .map(|(date, bucket)| (date.to_string(), bucket))
        .collect();

    Ok(Export {
        config: household.config().load()?,
        transactions_by_date,
    })
}

/// Restore `backup` into `household` and return how many transactions were imported.
///
/// The configuration is replaced and every transaction is appended to the
/// existing buckets. Transactions that fail validation or whose date does
/// not match their bucket are skipped with a warning.
///
/// The whole backup is checked before anything is written, so a rejected
/// backup leaves `household` unchanged.
///
/// # Errors
/// Returns an [Error::InvalidDateFormat] if a bucket key is not a date.
pub fn import(household: &Household, backup: Export) -> Result<usize, Error> {
    let (config, transactions) = prepare_import(backup)?;

    write_import(household, config, transactions)
}

/// Delete everything in `household` and restore `backup` in its place.
///
/// Like [import], nothing is deleted if the backup is rejected.
pub fn import_replacing(
    household: &Household,
    backup: Export,
    now: OffsetDateTime,
) -> Result<usize, Error> {
    let (config, transactions) = prepare_import(backup)?;
    household.clear_all(now)?;

    write_import(household, config, transactions)
}

/// Check every bucket key and pick out the transactions worth importing.
fn prepare_import(backup: Export) -> Result<(Configuration, Vec<Transaction>), Error> {
    let mut transactions = Vec::new();

    for (key, bucket) in backup.transactions_by_date {
        let date: Date = parse_date(&key)?;

        for transaction in bucket.transactions {
            if transaction.date != date {
                tracing::warn!(
                    "skipping transaction {} dated {} in the bucket for {date}",
                    transaction.id,
                    transaction.date
                );
                continue;
            }

            if let Err(error) = transaction.validate() {
                tracing::warn!("skipping invalid transaction {}: {error}", transaction.id);
                continue;
            }

            transactions.push(transaction);
        }
    }

    Ok((backup.config, transactions))
}

fn write_import(
    household: &Household,
    config: Configuration,
    transactions: Vec<Transaction>,
) -> Result<usize, Error> {
    household.config().save(&config)?;

    let imported = transactions.len();
    for transaction in transactions {
        household.transactions().append(transaction)?;
    }

    tracing::info!("imported {imported} transactions");

    Ok(imported)
}

/// The file name a backup taken on `today` is saved under.
pub fn export_file_name(today: Date) -> String {
    format!("household-budget-backup-{today}.json")
}

#[cfg(test)]
mod export_tests {
    use std::sync::Arc;

    use serde_json::json;
    use time::macros::{date, datetime};

    use crate::{
        Error, Household,
        export::{Export, export, export_file_name, import, import_replacing},
        storage::MemoryStorage,
        transaction::{Category, Transaction},
    };

    fn get_populated_household() -> Household {
        let household = Household::new(Arc::new(MemoryStorage::new()));
        household.config().set_budget(20000.0).unwrap();
        let asha = household.config().add_member("Asha").unwrap();
        let ravi = household.config().add_member("Ravi").unwrap();
        let now = datetime!(2026-02-09 10:00 UTC);
        household
            .add_transaction(
                Transaction::build(asha.id, 450.0, date!(2026 - 02 - 07), "Vegetables")
                    .category(Category::Food),
                now,
            )
            .unwrap();
        household
            .add_transaction(
                Transaction::build(ravi.id, 60.0, date!(2026 - 02 - 09), "Metro card")
                    .category(Category::Transport),
                now,
            )
            .unwrap();

        household
    }

    #[test]
    fn export_file_name_uses_date() {
        assert_eq!(
            export_file_name(date!(2026 - 02 - 07)),
            "household-budget-backup-2026-02-07.json"
        );
    }

    #[test]
    fn export_uses_camel_case_layout() {
        let household = get_populated_household();

        let value = serde_json::to_value(export(&household).unwrap()).unwrap();

        assert_eq!(value["config"]["budget"], json!(20000.0));
        assert_eq!(
            value["transactionsByDate"]["2026-02-07"]["transactions"][0]["description"],
            json!("Vegetables")
        );
    }

    #[test]
    fn import_of_export_reproduces_household() {
        let original = get_populated_household();
        let json = export(&original).unwrap().to_json().unwrap();
        let restored = Household::new(Arc::new(MemoryStorage::new()));

        let imported = import(&restored, Export::from_json(&json).unwrap());

        assert_eq!(imported, Ok(2));
        assert_eq!(export(&restored), export(&original));
    }

    fn get_backup_with_bad_key() -> Export {
        let mut backup = export(&get_populated_household()).unwrap();
        let bucket = backup.transactions_by_date.remove("2026-02-07").unwrap();
        backup
            .transactions_by_date
            .insert("yesterday".to_owned(), bucket);

        backup
    }

    #[test]
    fn rejected_import_leaves_household_unchanged() {
        let household = Household::new(Arc::new(MemoryStorage::new()));
        household.config().set_budget(500.0).unwrap();
        let before = export(&household).unwrap();

        let result = import(&household, get_backup_with_bad_key());

        assert_eq!(
            result,
            Err(Error::InvalidDateFormat("yesterday".to_owned()))
        );
        assert_eq!(export(&household).unwrap(), before);
        assert_eq!(household.config().load().unwrap().budget, 500.0);
        assert_eq!(household.transactions().scan_all(), Ok(vec![]));
    }

    #[test]
    fn rejected_replacing_import_deletes_nothing() {
        let household = get_populated_household();
        let before = export(&household).unwrap();

        let result = import_replacing(
            &household,
            get_backup_with_bad_key(),
            datetime!(2026-02-10 10:00 UTC),
        );

        assert!(result.is_err());
        assert_eq!(export(&household).unwrap(), before);
    }

    #[test]
    fn replacing_import_discards_existing_data() {
        let household = Household::new(Arc::new(MemoryStorage::new()));
        let stranger = household.config().add_member("Stranger").unwrap();
        household
            .add_transaction(
                Transaction::build(stranger.id, 5.0, date!(2026 - 02 - 01), "Chai"),
                datetime!(2026-02-01 10:00 UTC),
            )
            .unwrap();
        let original = get_populated_household();

        let imported = import_replacing(
            &household,
            export(&original).unwrap(),
            datetime!(2026-02-10 10:00 UTC),
        );

        assert_eq!(imported, Ok(2));
        assert_eq!(export(&household), export(&original));
    }
}
