//! skudb - transactional item catalog
//!
//! Allocates collision-safe item ids and strictly increasing SKUs, each SKU
//! assigned in the same atomic transaction that inserts its item.
//!
//! # Quick Start
//!
//! ```ignore
//! use skudb::{CatalogConfig, Database, ItemCatalog, ItemDb, NewItem, OpContext};
//! use std::sync::Arc;
//!
//! // In-memory store; use Database::open(dir) for a persistent one
//! let store = Arc::new(Database::ephemeral());
//! let catalog = ItemCatalog::open(store, CatalogConfig::default())?;
//!
//! let ctx = OpContext::background();
//! let spoon = catalog.add(&ctx, NewItem::new("spoon"))?;
//! assert_eq!(spoon.sku, 1000);
//! assert_eq!(catalog.get_by_sku(&ctx, 1000)?, spoon);
//! ```
//!
//! # Architecture
//!
//! The catalog only talks to its store through the `DocumentStore` trait.
//! The embedded [`Database`] is one implementation of it: MVCC storage,
//! optimistic transactions with automatic conflict retry, and a
//! write-ahead log.

pub use skudb_catalog::{
    CatalogConfig, CatalogError, CatalogResult, IdGenerator, Item, ItemCatalog, ItemDb, NewItem,
    ScriptedIds, UuidGenerator,
};
pub use skudb_core::{DocKey, Document, DocumentStore, OpContext, StoreError, StoreResult};
pub use skudb_engine::{Database, RetryConfig, StoreConfig};
