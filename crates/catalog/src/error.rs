//! Error types for the item catalog

use skudb_core::{DocKey, StoreError};
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Errors reported by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No item with this id or SKU
    #[error("{0}: not found")]
    NotFound(String),

    /// The SKU counter document exists but does not hold an integer `next`
    #[error("can't read SKU counter {key}: {found}")]
    MalformedCounter {
        /// Counter document
        key: DocKey,
        /// What was found instead
        found: String,
    },

    /// The SKU counter document disappeared after initialization
    #[error("SKU counter {key} is missing")]
    CounterMissing {
        /// Counter document
        key: DocKey,
    },

    /// The counter cannot advance without overflowing
    #[error("SKU counter {key} is exhausted")]
    SequenceExhausted {
        /// Counter document
        key: DocKey,
    },

    /// More than one item carries the same SKU
    #[error("sku {sku} is held by more than one item: {}", .ids.join(", "))]
    DuplicateSku {
        /// The duplicated SKU
        sku: i64,
        /// Ids of (some of) the items holding it
        ids: Vec<String>,
    },

    /// Item rejected before touching the store
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Catalog configuration rejected at open
    #[error("invalid catalog config: {0}")]
    InvalidConfig(String),

    /// Every generated id collided with an existing item
    #[error("no free item id after {attempts} attempts")]
    IdCollision {
        /// Ids tried
        attempts: usize,
    },

    /// A stored item could not be decoded
    #[error("item {id} decode: {source}")]
    Decode {
        /// Document id
        id: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Store failure (unavailable, I/O, cancellation, exhausted retries)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// True for a missing id or SKU
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// True when the store rejected a create because `key` exists
    pub(crate) fn is_already_exists_for(&self, key: &DocKey) -> bool {
        matches!(self, CatalogError::Store(StoreError::AlreadyExists(k)) if k == key)
    }
}
