//! Store configuration.

use serde::{Deserialize, Serialize};

/// How the store generates ids for new entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Decimal ids from a process-wide counter (`1`, `2`, ...).
    #[default]
    Sequential,
    /// Random v4 UUIDs.
    Uuid,
}

/// Version check applied to a transactional write of a key that was
/// never read in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreadWritePolicy {
    /// The write captures version 0, so it only commits if the entity
    /// does not exist yet.
    #[default]
    Strict,
    /// The write skips the version check and overwrites whatever is
    /// committed.
    Unchecked,
}

/// Configuration passed to `Database::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Id generation strategy.
    pub id_strategy: IdStrategy,

    /// Version check for writes to keys not read in the transaction.
    pub unread_write_policy: UnreadWritePolicy,

    /// Whether commit/rollback without an active transaction is an error.
    ///
    /// When false both are silent no-ops.
    pub strict_boundaries: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Sequential,
            unread_write_policy: UnreadWritePolicy::Strict,
            strict_boundaries: false,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id generation strategy.
    #[must_use]
    pub const fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Sets the policy for writes to unread keys.
    #[must_use]
    pub const fn unread_write_policy(mut self, policy: UnreadWritePolicy) -> Self {
        self.unread_write_policy = policy;
        self
    }

    /// Sets whether transaction boundaries are strict.
    #[must_use]
    pub const fn strict_boundaries(mut self, value: bool) -> Self {
        self.strict_boundaries = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.unread_write_policy, UnreadWritePolicy::Strict);
        assert!(!config.strict_boundaries);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .id_strategy(IdStrategy::Uuid)
            .unread_write_policy(UnreadWritePolicy::Unchecked)
            .strict_boundaries(true);

        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.unread_write_policy, UnreadWritePolicy::Unchecked);
        assert!(config.strict_boundaries);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"unread_write_policy":"unchecked"}"#).unwrap();
        assert_eq!(config.unread_write_policy, UnreadWritePolicy::Unchecked);
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
        assert!(!config.strict_boundaries);
    }
}
