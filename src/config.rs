//! Process-level configuration

use crate::database::{DatabaseConfig, DatabasePath, SchemaResult};
use crate::domain_types::{EvictionIntervalSecs, EvictionThresholdSecs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the process consumes at startup
///
/// The chat-platform credential is deliberately absent: `API_KEY` is read
/// from the `meta` table, not from configuration or the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickfixConfig {
    /// SQLite database file of the persistent store
    pub database_path: PathBuf,
    /// Sleep interval of the eviction task
    pub eviction_interval: EvictionIntervalSecs,
    /// Age past which pending registrations are dropped
    pub eviction_threshold: EvictionThresholdSecs,
    /// Base URL of the Bot API endpoint
    pub api_base_url: String,
    /// Long-poll timeout passed to the platform, in seconds
    pub poll_timeout_secs: u64,
}

impl Default for StickfixConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("stickfix.db"),
            eviction_interval: EvictionIntervalSecs::default(),
            eviction_threshold: EvictionThresholdSecs::default(),
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

impl StickfixConfig {
    /// Builds the persistent store's database configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured path is not a valid `.db` path.
    pub fn database_config(&self) -> SchemaResult<DatabaseConfig> {
        Ok(DatabaseConfig::new(DatabasePath::new(&self.database_path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_use_documented_defaults_when_config_omitted() {
        let config = StickfixConfig::default();
        assert_eq!(config.database_path, PathBuf::from("stickfix.db"));
        assert_eq!(config.eviction_interval.into_inner(), 900);
        assert_eq!(config.eviction_threshold.into_inner(), 3600);
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    fn test_should_round_trip_when_serialized_as_json() {
        let config = StickfixConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: StickfixConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.database_path, config.database_path);
        assert_eq!(restored.eviction_interval, config.eviction_interval);
    }
}
