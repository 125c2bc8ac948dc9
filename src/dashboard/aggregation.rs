//! Transaction data aggregation for the dashboard.
//!
//! Every function here is pure: it works on a [Snapshot] (or a slice of
//! transactions) taken from the stores and never fails. Corrupt buckets have
//! already been skipped by the time a snapshot exists.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use time::Date;

use crate::{
    config::{Configuration, MemberId},
    transaction::{Category, Transaction},
};

/// The configuration and every transaction at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The household configuration.
    pub config: Configuration,
    /// Every readable transaction, in no particular order.
    pub transactions: Vec<Transaction>,
}

/// Budget totals across all transactions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    /// The configured budget.
    pub budget: f64,
    /// The sum of every transaction amount, including those of removed members.
    pub total_spent: f64,
    /// `budget - total_spent`. Negative when over budget.
    pub total_remaining: f64,
    /// How much of the budget has been spent, as a percentage. Zero when there is no budget.
    pub percentage: f64,
    /// How much of the budget is left, as a percentage. Zero when there is no budget.
    pub remaining_percentage: f64,
    /// The number of transactions.
    pub transaction_count: usize,
}

/// Calculates the budget totals.
///
/// The percentages are zero when the budget is zero rather than dividing by zero.
pub fn totals(snapshot: &Snapshot) -> Totals {
    let budget = snapshot.config.budget;
    let total_spent: f64 = snapshot
        .transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum();
    let total_remaining = budget - total_spent;

    let as_percentage = |amount: f64| {
        if budget > 0.0 {
            amount / budget * 100.0
        } else {
            0.0
        }
    };

    Totals {
        budget,
        total_spent,
        total_remaining,
        percentage: as_percentage(total_spent),
        remaining_percentage: as_percentage(total_remaining),
        transaction_count: snapshot.transactions.len(),
    }
}

/// How much one member has spent.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSpend {
    /// The member's ID.
    pub member_id: MemberId,
    /// The member's display name.
    pub name: String,
    /// The sum of the member's transactions.
    pub amount: f64,
    /// How many transactions the member logged.
    pub count: usize,
}

/// Totals spending per configured member, in the order members were added.
///
/// Members without transactions are included with zero values. Transactions
/// that refer to a member who no longer exists are left out.
pub fn spend_by_member(snapshot: &Snapshot) -> Vec<MemberSpend> {
    let mut spend_by_id: HashMap<&MemberId, (f64, usize)> = snapshot
        .config
        .members
        .iter()
        .map(|member| (&member.id, (0.0, 0)))
        .collect();

    for transaction in &snapshot.transactions {
        if let Some((amount, count)) = spend_by_id.get_mut(&transaction.member_id) {
            *amount += transaction.amount;
            *count += 1;
        }
    }

    snapshot
        .config
        .members
        .iter()
        .map(|member| {
            let (amount, count) = spend_by_id[&member.id];

            MemberSpend {
                member_id: member.id.clone(),
                name: member.name.to_string(),
                amount,
                count,
            }
        })
        .collect()
}

/// Returns the transactions with the most recently created first.
///
/// The sort is stable: transactions created at the same instant keep their
/// relative order.
pub fn sorted_transactions(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

/// A summary of what is held in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// The number of date buckets.
    pub bucket_count: usize,
    /// The number of transactions across all buckets.
    pub transaction_count: usize,
    /// The earliest bucket date, `None` if there are no buckets.
    pub oldest_date: Option<Date>,
    /// The latest bucket date, `None` if there are no buckets.
    pub newest_date: Option<Date>,
}

/// Summarizes the buckets in storage.
///
/// # Arguments
/// * `dates` - The dates that have a bucket
/// * `transactions` - Every transaction across those buckets
pub fn storage_stats(dates: &BTreeSet<Date>, transactions: &[Transaction]) -> StorageStats {
    StorageStats {
        bucket_count: dates.len(),
        transaction_count: transactions.len(),
        oldest_date: dates.first().copied(),
        newest_date: dates.last().copied(),
    }
}

/// How much was spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    /// The category.
    pub category: Category,
    /// The sum of transactions in the category.
    pub amount: f64,
    /// The number of transactions in the category.
    pub count: usize,
}

/// Totals spending per category, sorted by category name.
pub fn spend_by_category(transactions: &[Transaction]) -> Vec<CategorySpend> {
    let mut spend_by_name: BTreeMap<&str, CategorySpend> = BTreeMap::new();

    for transaction in transactions {
        let entry = spend_by_name
            .entry(transaction.category.name())
            .or_insert_with(|| CategorySpend {
                category: transaction.category.clone(),
                amount: 0.0,
                count: 0,
            });
        entry.amount += transaction.amount;
        entry.count += 1;
    }

    spend_by_name.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::{
        OffsetDateTime,
        macros::{date, datetime},
    };

    use crate::{
        config::{Configuration, Member, MemberId, MemberName},
        dashboard::aggregation::{
            Snapshot, sorted_transactions, spend_by_category, spend_by_member, storage_stats,
            totals,
        },
        transaction::{Category, Transaction, TransactionId},
    };

    fn create_test_transaction(
        member: &str,
        amount: f64,
        created_at: OffsetDateTime,
    ) -> Transaction {
        Transaction::build(MemberId::new(member), amount, date!(2026 - 02 - 07), "Test")
            .finalize(created_at)
            .unwrap()
    }

    fn create_test_config(budget: f64, member_names: &[&str]) -> Configuration {
        let mut config = Configuration::new(datetime!(2026-02-07 0:00 UTC));
        config.budget = budget;
        config.members = member_names
            .iter()
            .map(|name| Member {
                id: MemberId::new(name),
                name: MemberName::new_unchecked(name),
            })
            .collect();
        config
    }

    #[test]
    fn totals_sums_transactions() {
        let now = datetime!(2026-02-07 10:00 UTC);
        let snapshot = Snapshot {
            config: create_test_config(200.0, &["A"]),
            transactions: vec![
                create_test_transaction("A", 50.0, now),
                create_test_transaction("A", 100.0, now),
            ],
        };

        let result = totals(&snapshot);

        assert_eq!(result.total_spent, 150.0);
        assert_eq!(result.total_remaining, 50.0);
        assert_eq!(result.percentage, 75.0);
        assert_eq!(result.remaining_percentage, 25.0);
        assert_eq!(result.transaction_count, 2);
    }

    #[test]
    fn totals_with_zero_budget_has_zero_percentage() {
        let snapshot = Snapshot {
            config: create_test_config(0.0, &["A"]),
            transactions: vec![create_test_transaction("A", 75.0, datetime!(2026-02-07 10:00 UTC))],
        };

        let result = totals(&snapshot);

        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.remaining_percentage, 0.0);
        assert_eq!(result.total_remaining, -75.0);
    }

    #[test]
    fn totals_remaining_goes_negative_when_over_budget() {
        let snapshot = Snapshot {
            config: create_test_config(100.0, &["A"]),
            transactions: vec![create_test_transaction(
                "A",
                150.0,
                datetime!(2026-02-07 10:00 UTC),
            )],
        };

        let result = totals(&snapshot);

        assert_eq!(result.total_remaining, -50.0);
        assert_eq!(result.percentage, 150.0);
    }

    #[test]
    fn spend_by_member_includes_members_without_transactions() {
        let snapshot = Snapshot {
            config: create_test_config(100.0, &["A", "B"]),
            transactions: vec![create_test_transaction("A", 10.0, datetime!(2026-02-07 10:00 UTC))],
        };

        let result = spend_by_member(&snapshot);

        assert_eq!(result.len(), 2);
        assert_eq!((result[0].name.as_str(), result[0].amount, result[0].count), ("A", 10.0, 1));
        assert_eq!((result[1].name.as_str(), result[1].amount, result[1].count), ("B", 0.0, 0));
    }

    #[test]
    fn spend_by_member_excludes_unknown_members_from_members_but_not_total() {
        let now = datetime!(2026-02-07 10:00 UTC);
        let snapshot = Snapshot {
            config: create_test_config(100.0, &["A"]),
            transactions: vec![
                create_test_transaction("A", 10.0, now),
                create_test_transaction("ghost", 5.0, now),
            ],
        };

        let by_member = spend_by_member(&snapshot);

        assert_eq!(by_member.len(), 1);
        assert_eq!(by_member[0].amount, 10.0);
        assert_eq!(totals(&snapshot).total_spent, 15.0);
    }

    #[test]
    fn spend_by_member_sums_to_total_when_all_members_exist() {
        let now = datetime!(2026-02-07 10:00 UTC);
        let snapshot = Snapshot {
            config: create_test_config(100.0, &["A", "B", "C"]),
            transactions: vec![
                create_test_transaction("A", 10.25, now),
                create_test_transaction("B", 5.5, now),
                create_test_transaction("C", 0.25, now),
                create_test_transaction("A", 4.0, now),
            ],
        };

        let member_total: f64 = spend_by_member(&snapshot).iter().map(|m| m.amount).sum();

        assert_eq!(member_total, totals(&snapshot).total_spent);
    }

    #[test]
    fn sorted_transactions_puts_newest_first() {
        let older = create_test_transaction("A", 1.0, datetime!(2026-02-07 9:00 UTC));
        let newer = create_test_transaction("A", 2.0, datetime!(2026-02-07 11:00 UTC));

        let result = sorted_transactions(&[older.clone(), newer.clone()]);

        assert_eq!(result, vec![newer, older]);
    }

    #[test]
    fn sorted_transactions_is_stable_for_ties() {
        let same_time = datetime!(2026-02-07 10:00 UTC);
        let mut first = create_test_transaction("A", 1.0, same_time);
        first.id = TransactionId::new("first");
        let mut second = create_test_transaction("A", 2.0, same_time);
        second.id = TransactionId::new("second");
        let mut third = create_test_transaction("A", 3.0, same_time);
        third.id = TransactionId::new("third");
        let newest = create_test_transaction("A", 4.0, datetime!(2026-02-07 12:00 UTC));

        let result = sorted_transactions(&[
            first.clone(),
            second.clone(),
            newest.clone(),
            third.clone(),
        ]);

        assert_eq!(result, vec![newest, first, second, third]);
    }

    #[test]
    fn storage_stats_reports_date_range() {
        let dates = BTreeSet::from([
            date!(2026 - 02 - 09),
            date!(2026 - 02 - 01),
            date!(2026 - 02 - 05),
        ]);
        let now = datetime!(2026-02-07 10:00 UTC);
        let transactions = vec![
            create_test_transaction("A", 1.0, now),
            create_test_transaction("A", 1.0, now),
        ];

        let stats = storage_stats(&dates, &transactions);

        assert_eq!(stats.bucket_count, 3);
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(stats.oldest_date, Some(date!(2026 - 02 - 01)));
        assert_eq!(stats.newest_date, Some(date!(2026 - 02 - 09)));
    }

    #[test]
    fn storage_stats_handles_empty_store() {
        let stats = storage_stats(&BTreeSet::new(), &[]);

        assert_eq!(stats.bucket_count, 0);
        assert_eq!(stats.oldest_date, None);
        assert_eq!(stats.newest_date, None);
    }

    #[test]
    fn spend_by_category_groups_and_sorts_by_name() {
        let now = datetime!(2026-02-07 10:00 UTC);
        let mut transport = create_test_transaction("A", 20.0, now);
        transport.category = Category::Transport;
        let mut food = create_test_transaction("A", 5.0, now);
        food.category = Category::Food;
        let mut more_food = create_test_transaction("A", 7.5, now);
        more_food.category = Category::Food;

        let result = spend_by_category(&[transport, food, more_food]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].category, Category::Food);
        assert_eq!(result[0].amount, 12.5);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[1].category, Category::Transport);
    }
}
