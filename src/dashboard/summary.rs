//! The dashboard view model: everything the front end shows, computed from one snapshot.

use std::fmt::Display;

use time::{Date, OffsetDateTime};

use crate::{
    config::MemberId,
    dashboard::aggregation::{
        CategorySpend, MemberSpend, Snapshot, Totals, sorted_transactions, spend_by_category,
        spend_by_member, totals,
    },
    transaction::{Category, TransactionId},
};

/// Spending at or above this percentage of the budget is high.
const HIGH_SPENDING_THRESHOLD: f64 = 70.0;
/// Spending at or above this percentage of the budget counts as over budget.
const OVER_BUDGET_THRESHOLD: f64 = 90.0;

/// How spending compares to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Less than 70% of the budget has been spent.
    OnTrack,
    /// At least 70% of the budget has been spent.
    HighSpending,
    /// At least 90% of the budget has been spent.
    OverBudget,
}

impl BudgetStatus {
    /// Classify the percentage of the budget that has been spent.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= OVER_BUDGET_THRESHOLD {
            BudgetStatus::OverBudget
        } else if percentage >= HIGH_SPENDING_THRESHOLD {
            BudgetStatus::HighSpending
        } else {
            BudgetStatus::OnTrack
        }
    }
}

impl Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BudgetStatus::OnTrack => "On track",
            BudgetStatus::HighSpending => "High spending",
            BudgetStatus::OverBudget => "Over budget",
        };

        f.write_str(label)
    }
}

/// A transaction as shown in the dashboard's transaction list.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRow {
    /// The transaction ID.
    pub id: TransactionId,
    /// The date of the expense.
    pub date: Date,
    /// Who logged the expense.
    pub member_id: MemberId,
    /// The member's name, or "Unknown" if the member has been removed.
    pub member_name: String,
    /// The expense category.
    pub category: Category,
    /// What the money was spent on.
    pub description: String,
    /// The amount spent.
    pub amount: f64,
}

/// Everything the dashboard displays.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Budget, spending and remaining totals.
    pub totals: Totals,
    /// How spending compares to the budget.
    pub status: BudgetStatus,
    /// How full the progress bar is, `percentage` capped at 100.
    pub progress: f64,
    /// Spending per member, in the order members were added.
    pub members: Vec<MemberSpend>,
    /// Spending per category, sorted by name.
    pub categories: Vec<CategorySpend>,
    /// Every transaction, most recently created first.
    pub transactions: Vec<DashboardRow>,
    /// When old transactions were last cleaned up.
    pub last_cleanup: OffsetDateTime,
}

impl Dashboard {
    /// Build the dashboard for `snapshot`.
    pub fn new(snapshot: &Snapshot) -> Self {
        let totals = totals(snapshot);

        let transactions = sorted_transactions(&snapshot.transactions)
            .into_iter()
            .map(|transaction| DashboardRow {
                member_name: snapshot.config.member_name(&transaction.member_id).to_owned(),
                id: transaction.id,
                date: transaction.date,
                member_id: transaction.member_id,
                category: transaction.category,
                description: transaction.description,
                amount: transaction.amount,
            })
            .collect();

        Self {
            status: BudgetStatus::from_percentage(totals.percentage),
            progress: totals.percentage.min(100.0),
            totals,
            members: spend_by_member(snapshot),
            categories: spend_by_category(&snapshot.transactions),
            transactions,
            last_cleanup: snapshot.config.last_cleanup,
        }
    }
}

/// Pluralize `noun` for `count`, e.g. "1 transaction" or "3 transactions".
pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
