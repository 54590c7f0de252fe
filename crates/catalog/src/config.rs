//! Catalog configuration
//!
//! Names the two collections the catalog uses, the counter document and the
//! first SKU handed out on an empty store.

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};

/// Default data collection
pub const DEFAULT_DATA_COLLECTION: &str = "items";
/// Default util collection
pub const DEFAULT_UTIL_COLLECTION: &str = "util";
/// Default counter document id
pub const DEFAULT_COUNTER_ID: &str = "Next$SKU";
/// Default first SKU
pub const DEFAULT_START_SKU: i64 = 1000;
/// Default cap on id regenerations per `add`
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 16;

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Collection holding one document per item
    pub data_collection: String,
    /// Collection holding the SKU counter
    pub util_collection: String,
    /// Document id of the SKU counter
    pub counter_id: String,
    /// Counter value written when the counter does not exist yet
    pub start_sku: i64,
    /// How many ids `add` tries before giving up on collisions
    pub max_id_attempts: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_collection: DEFAULT_DATA_COLLECTION.to_string(),
            util_collection: DEFAULT_UTIL_COLLECTION.to_string(),
            counter_id: DEFAULT_COUNTER_ID.to_string(),
            start_sku: DEFAULT_START_SKU,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl CatalogConfig {
    /// Set the data collection
    pub fn with_data_collection(mut self, name: impl Into<String>) -> Self {
        self.data_collection = name.into();
        self
    }

    /// Set the util collection
    pub fn with_util_collection(mut self, name: impl Into<String>) -> Self {
        self.util_collection = name.into();
        self
    }

    /// Set the counter document id
    pub fn with_counter_id(mut self, id: impl Into<String>) -> Self {
        self.counter_id = id.into();
        self
    }

    /// Set the seed SKU
    pub fn with_start_sku(mut self, start: i64) -> Self {
        self.start_sku = start;
        self
    }

    /// Set the id attempt cap
    pub fn with_max_id_attempts(mut self, attempts: usize) -> Self {
        self.max_id_attempts = attempts;
        self
    }

    /// Check the configuration before opening a catalog
    pub fn validate(&self) -> CatalogResult<()> {
        if self.data_collection.is_empty() || self.util_collection.is_empty() {
            return Err(CatalogError::InvalidConfig(
                "collection names must not be empty".to_string(),
            ));
        }
        if self.counter_id.is_empty() {
            return Err(CatalogError::InvalidConfig(
                "counter id must not be empty".to_string(),
            ));
        }
        if self.max_id_attempts == 0 {
            return Err(CatalogError::InvalidConfig(
                "max_id_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
