//! Persistence for the singleton budget configuration.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::{
    Error,
    config::{Configuration, Member, MemberId, MemberName},
    storage::Storage,
    transaction::TransactionStore,
};

/// The storage key of the configuration record.
pub const CONFIG_KEY: &str = "budgetConfig";

/// Reads and writes the household's [Configuration].
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn Storage>,
}

impl ConfigStore {
    /// Create a store on top of `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Get the configuration, creating and saving the default if there is none.
    ///
    /// # Errors
    /// Returns an [Error::CorruptConfig] if the stored record cannot be parsed.
    pub fn load(&self) -> Result<Configuration, Error> {
        match self.storage.get(CONFIG_KEY)? {
            Some(json) => {
                let config: Configuration = serde_json::from_str(&json)
                    .map_err(|error| Error::CorruptConfig(error.to_string()))?;

                if !config.budget.is_finite() || config.budget < 0.0 {
                    return Err(Error::CorruptConfig(format!(
                        "invalid budget {}",
                        config.budget
                    )));
                }

                Ok(config)
            }
            None => {
                let config = Configuration::new(OffsetDateTime::now_utc());
                self.save(&config)?;
                tracing::debug!("created default budget configuration");

                Ok(config)
            }
        }
    }

    /// Persist the whole configuration in a single write.
    pub fn save(&self, config: &Configuration) -> Result<(), Error> {
        let json = serde_json::to_string(config)?;

        self.storage.set(CONFIG_KEY, &json)
    }

    /// Add a member called `name`.
    ///
    /// # Errors
    /// Returns an [Error::EmptyMemberName] if `name` is blank, or an
    /// [Error::DuplicateMemberName] if a member with the same name (ignoring
    /// case) already exists.
    pub fn add_member(&self, name: &str) -> Result<Member, Error> {
        let name = MemberName::new(name)?;
        let mut config = self.load()?;

        if config.members.iter().any(|member| member.name.matches(&name)) {
            return Err(Error::DuplicateMemberName(name.to_string()));
        }

        let member = Member {
            id: MemberId::generate(OffsetDateTime::now_utc()),
            name,
        };
        config.members.push(member.clone());
        self.save(&config)?;

        tracing::info!("added member {} ({})", member.name, member.id);

        Ok(member)
    }

    /// Remove the member `id` and every transaction they logged.
    ///
    /// Removing an unknown member is a no-op. Returns the number of
    /// transactions that were deleted.
    pub fn remove_member(
        &self,
        id: &MemberId,
        transactions: &TransactionStore,
    ) -> Result<usize, Error> {
        let mut config = self.load()?;
        let original_len = config.members.len();
        config.members.retain(|member| &member.id != id);

        if config.members.len() == original_len {
            tracing::debug!("member {id} does not exist, nothing to remove");
            return Ok(0);
        }

        self.save(&config)?;
        let removed = transactions.remove_by_member(id)?;
        tracing::info!("removed member {id} and {removed} of their transactions");

        Ok(removed)
    }

    /// Set the household budget.
    ///
    /// # Errors
    /// Returns an [Error::InvalidBudget] if `amount` is negative or not a finite number.
    pub fn set_budget(&self, amount: f64) -> Result<Configuration, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidBudget(amount));
        }

        let mut config = self.load()?;
        config.budget = amount;
        self.save(&config)?;

        Ok(config)
    }

    /// Record that the retention sweeper deleted data at `timestamp`.
    pub fn record_cleanup(&self, timestamp: OffsetDateTime) -> Result<(), Error> {
        let mut config = self.load()?;
        config.last_cleanup = timestamp;

        self.save(&config)
    }

    /// Replace the configuration with the default one.
    pub fn reset(&self, now: OffsetDateTime) -> Result<Configuration, Error> {
        let config = Configuration::new(now);
        self.save(&config)?;

        Ok(config)
    }
}
