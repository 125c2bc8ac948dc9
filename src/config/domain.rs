//! Core configuration domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, id::time_derived_id};

/// The opaque, unique identifier of a [Member].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Wrap an existing ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// Create a fresh ID derived from `now`.
    pub(crate) fn generate(now: OffsetDateTime) -> Self {
        Self(time_derived_id(now))
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty member name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct MemberName(String);

impl MemberName {
    /// Create a member name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyMemberName] if `name` is empty or just whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyMemberName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a member name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Whether two names refer to the same person, ignoring case.
    pub fn matches(&self, other: &MemberName) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }
}

impl AsRef<str> for MemberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for MemberName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemberName::new(s)
    }
}

impl Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person in the household who logs expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Member {
    /// Identifies the member in transactions.
    pub id: MemberId,
    /// The display name, unique within the household ignoring case.
    pub name: MemberName,
}

/// The budget settings shared by the whole household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// The total budget. Never negative.
    pub budget: f64,
    /// Members in the order they were added. IDs and names (ignoring case) are unique.
    pub members: Vec<Member>,
    /// When the retention sweeper last deleted anything.
    #[serde(with = "time::serde::rfc3339")]
    pub last_cleanup: OffsetDateTime,
}

impl Configuration {
    /// The configuration used before anything has been saved.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            budget: 0.0,
            members: Vec::new(),
            last_cleanup: now,
        }
    }

    /// Look up a member by ID.
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|member| &member.id == id)
    }

    /// The name to display for `id`, or `"Unknown"` for members that have been removed.
    pub fn member_name(&self, id: &MemberId) -> &str {
        self.member(id)
            .map_or(UNKNOWN_MEMBER_NAME, |member| member.name.as_ref())
    }
}

/// Shown in place of the name of a member that no longer exists.
pub const UNKNOWN_MEMBER_NAME: &str = "Unknown";

#[cfg(test)]
mod member_name_tests {
    use crate::{Error, config::MemberName};

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(MemberName::new(""), Err(Error::EmptyMemberName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(MemberName::new("\n\t \r"), Err(Error::EmptyMemberName));
    }

    #[test]
    fn new_trims_whitespace() {
        assert_eq!(MemberName::new("  Asha "), Ok(MemberName::new_unchecked("Asha")));
    }

    #[test]
    fn matches_ignores_case() {
        let name = MemberName::new_unchecked("Asha");

        assert!(name.matches(&MemberName::new_unchecked("ASHA")));
        assert!(!name.matches(&MemberName::new_unchecked("Ravi")));
    }
}
