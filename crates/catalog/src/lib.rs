//! Item catalog for skudb
//!
//! Allocates collision-safe item ids and strictly increasing SKUs on top of
//! any transactional document store implementing
//! [`DocumentStore`](skudb_core::DocumentStore):
//! - ItemCollection: typed access to the data collection
//! - SequenceManager: the SKU counter document
//! - create: SKU allocation and insert in one transaction, id regeneration
//!   on collision
//! - ItemCatalog / ItemDb: add, get, get-by-sku, list, list-skus, update,
//!   delete
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(Database::ephemeral());
//! let catalog = ItemCatalog::open(store, CatalogConfig::default())?;
//! let ctx = OpContext::background();
//! let spoon = catalog.add(&ctx, NewItem::new("spoon"))?;
//! assert_eq!(spoon.sku, 1000);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod collection;
pub mod config;
mod create;
pub mod error;
pub mod ids;
pub mod record;
pub mod sequence;

pub use catalog::{ItemCatalog, ItemDb};
pub use collection::ItemCollection;
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use ids::{IdGenerator, ScriptedIds, UuidGenerator};
pub use record::{Item, NewItem, SequenceCounter};
pub use sequence::SequenceManager;
