//! Dashboard module
//!
//! Summarizes the household's spending: budget totals, spend per member and
//! per category, storage statistics and the dashboard view model.

mod aggregation;
mod summary;

pub use aggregation::{
    CategorySpend, MemberSpend, Snapshot, StorageStats, Totals, sorted_transactions,
    spend_by_category, spend_by_member, storage_stats, totals,
};
pub use summary::{BudgetStatus, Dashboard, DashboardRow, count_label};
