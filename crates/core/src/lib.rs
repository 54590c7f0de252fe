//! Core types and traits for skudb
//!
//! This crate defines the contract between the catalog layer and whatever
//! transactional document store it runs against:
//! - DocKey / Document / StoredDoc: addressing and payloads
//! - Query: equality filter, ordering, limit
//! - OpContext: deadline and cancellation carried by every operation
//! - StoreError: error taxonomy reported by stores
//! - DocumentOps / DocumentStore: transactional and detached access

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;

pub use context::OpContext;
pub use error::{StoreError, StoreResult};
pub use query::{Direction, FieldFilter, OrderBy, Query};
pub use traits::{Detached, DocumentOps, DocumentStore};
pub use types::{compare_values, decode, encode, DocKey, Document, ResolvedWrite, StoredDoc};
