//! Database configuration via `skudb.toml`
//!
//! On first open, a default `skudb.toml` is created in the data directory.
//! To change settings, edit the file and reopen.

use super::transactions::RetryConfig;
use serde::{Deserialize, Serialize};
use skudb_core::{StoreError, StoreResult};
use skudb_durability::DurabilityMode;
use std::path::Path;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "skudb.toml";

/// Store configuration loaded from `skudb.toml`.
///
/// # Example
///
/// ```toml
/// durability = "always"
///
/// [retry]
/// max_retries = 64
/// base_delay_ms = 1
/// max_delay_ms = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// WAL sync policy
    #[serde(default = "default_durability")]
    pub durability: DurabilityMode,
    /// Conflict retry policy used by `DocumentStore::run_transaction`
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_durability() -> DurabilityMode {
    DurabilityMode::Always
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            durability: default_durability(),
            retry: RetryConfig::default(),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration: no WAL, default retry
    pub fn ephemeral() -> Self {
        Self {
            durability: DurabilityMode::Cache,
            retry: RetryConfig::default(),
        }
    }

    /// Set the durability mode
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# skudb store configuration
#
# Durability mode: "always" (default), "buffered" or "cache"
#   "always"   = fsync every commit, zero data loss
#   "buffered" = WAL written on commit, fsynced at shutdown
#   "cache"    = no WAL, nothing survives a restart
durability = "always"

# Retry policy for transactions that lose a commit race.
[retry]
max_retries = 64
base_delay_ms = 1
max_delay_ms = 20
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            StoreError::InvalidOperation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_always() {
        let config = StoreConfig::default();
        assert_eq!(config.durability, DurabilityMode::Always);
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn parse_buffered_with_partial_retry() {
        let config: StoreConfig =
            toml::from_str("durability = \"buffered\"\n[retry]\nmax_retries = 3\n").unwrap();
        assert_eq!(config.durability, DurabilityMode::Buffered);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, RetryConfig::default().base_delay_ms);
    }

    #[test]
    fn parse_invalid_mode_returns_error() {
        assert!(toml::from_str::<StoreConfig>("durability = \"turbo\"").is_err());
    }

    #[test]
    fn default_toml_parses_to_default() {
        let config: StoreConfig = toml::from_str(StoreConfig::default_toml()).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&path).unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), StoreConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "durability = \"buffered\"\n").unwrap();
        StoreConfig::write_default_if_missing(&path).unwrap();
        assert_eq!(
            StoreConfig::from_file(&path).unwrap().durability,
            DurabilityMode::Buffered
        );
    }

    #[test]
    fn write_to_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = StoreConfig::default()
            .with_durability(DurabilityMode::Buffered)
            .with_retry(RetryConfig::no_retry());
        config.write_to_file(&path).unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), config);
    }
}
