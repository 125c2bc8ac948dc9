use time::Date;

use crate::transaction::{Transaction, TransactionId};

/// A change to the local store that should be copied to the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A transaction was appended to the bucket for its date.
    Append(Transaction),
    /// A transaction was removed from the bucket for `date`.
    Remove {
        /// The date of the bucket the transaction was in.
        date: Date,
        /// The ID of the removed transaction.
        transaction_id: TransactionId,
    },
}

impl SyncEvent {
    /// A short description for log messages.
    pub fn describe(&self) -> String {
        match self {
            SyncEvent::Append(transaction) => {
                format!("append {} on {}", transaction.id, transaction.date)
            }
            SyncEvent::Remove {
                date,
                transaction_id,
            } => format!("remove {transaction_id} on {date}"),
        }
    }
}
