//! Defines the core data models for transactions.

use std::{convert::Infallible, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, config::MemberId, id::time_derived_id};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub(crate) use iso_date::deserialize as deserialize_iso_date;
pub(crate) use iso_date::serialize as serialize_iso_date;

// ============================================================================
// MODELS
// ============================================================================

/// The opaque, unique identifier of a [Transaction].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an existing ID, e.g. one typed in by the user.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an expense was for.
///
/// Categories are persisted as plain strings. Strings that do not match a
/// built-in category are kept as [Category::Custom] so that records written
/// by other tools survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Groceries, eating out.
    Food,
    /// Fuel, fares, parking.
    Transport,
    /// Electricity, water, internet.
    Utilities,
    /// Outings, subscriptions.
    Entertainment,
    /// Doctor visits, medicine.
    Healthcare,
    /// Clothes, household goods.
    Shopping,
    /// Fees, books, courses.
    Education,
    /// Anything else.
    Other,
    /// A category name that is not one of the built-in categories.
    Custom(String),
}

impl Category {
    /// The built-in categories in display order.
    pub const BUILT_IN: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Shopping,
        Category::Education,
        Category::Other,
    ];

    /// The name the category is stored and displayed as.
    pub fn name(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Education => "Education",
            Category::Other => "Other",
            Category::Custom(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::BUILT_IN
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(value.trim()))
            .unwrap_or(Category::Custom(value))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Custom(name) => name,
            built_in => built_in.name().to_owned(),
        }
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from(s.to_owned()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An expense logged by a household member.
///
/// Transactions are immutable once created; the only change allowed is deletion.
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, derived from when it was created.
    pub id: TransactionId,
    /// The member who spent the money.
    pub member_id: MemberId,
    /// How much was spent.
    pub amount: f64,
    /// What the money was spent on.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The day the money was spent. Determines which bucket the transaction lives in.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// When the transaction was logged.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        member_id: MemberId,
        amount: f64,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            member_id,
            amount,
            category: Category::Other,
            date,
            description: description.to_owned(),
        }
    }

    /// Check the invariants that hold for every stored transaction.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        validate_amount(self.amount)?;

        if self.description.trim().is_empty() {
            return Err(Error::EmptyField("description"));
        }

        if self.member_id.as_ref().is_empty() {
            return Err(Error::EmptyField("memberId"));
        }

        if self.id.as_ref().is_empty() {
            return Err(Error::EmptyField("id"));
        }

        Ok(())
    }
}

/// A builder for creating [Transaction] instances.
///
/// The ID and creation time are assigned by [TransactionBuilder::finalize].
///
/// # Examples
///
/// ```ignore
/// use time::{macros::{date, datetime}};
///
/// let transaction = Transaction::build(member.id.clone(), 45.99, date!(2026-02-07), "Vegetables")
///     .category(Category::Food)
///     .finalize(datetime!(2026-02-07 18:30 UTC))
///     .unwrap();
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The member who spent the money.
    pub member_id: MemberId,

    /// How much was spent. Must be finite and not negative.
    pub amount: f64,

    /// Defaults to [Category::Other].
    pub category: Category,

    /// The day the money was spent.
    pub date: Date,

    /// A human-readable description, e.g. `"Milk and bread"`. Must not be blank.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Validate the fields and create the transaction, using `now` as the creation time.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] for negative or non-finite amounts,
    /// or an [Error::EmptyField] if the description or member ID is blank.
    pub fn finalize(self, now: OffsetDateTime) -> Result<Transaction, Error> {
        let transaction = Transaction {
            id: TransactionId(time_derived_id(now)),
            member_id: self.member_id,
            amount: self.amount,
            category: self.category,
            description: self.description.trim().to_owned(),
            date: self.date,
            created_at: now,
        };

        transaction.validate()?;

        Ok(transaction)
    }
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Parse a `yyyy-mm-dd` date string.
///
/// # Errors
/// Returns an [Error::InvalidDateFormat] if `text` is not a valid calendar date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(
        text,
        time::macros::format_description!("[year]-[month]-[day]"),
    )
    .map_err(|_| Error::InvalidDateFormat(text.to_owned()))
}
