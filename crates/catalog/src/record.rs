//! Catalog records
//!
//! [`Item`] is what the data collection stores, one document per item,
//! keyed by its id. [`SequenceCounter`] is the body of the counter document
//! in the util collection.

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};

/// A catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Globally unique id, assigned at creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Stock keeping unit, assigned once at creation
    pub sku: i64,
}

/// Input to `add`: everything the caller chooses about a new item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name; must not be blank
    pub name: String,
}

impl NewItem {
    /// New item with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub(crate) fn validate(&self) -> CatalogResult<()> {
        validate_name(&self.name)
    }
}

pub(crate) fn validate_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidItem("name must not be empty".to_string()));
    }
    Ok(())
}

/// Body of the SKU counter document: the next SKU to hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    /// Next unassigned SKU
    pub next: i64,
}
