//! Concurrency layer for skudb
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: snapshot reads, read/scan set tracking, buffered writes
//! - Snapshot isolation over registered storage snapshots
//! - Conflict detection at commit time (first-committer-wins)
//! - Create/update preconditions checked against the latest committed state

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::TransactionManager;
pub use transaction::{CommitError, PendingWrite, Precondition, TransactionContext, TransactionStatus};
pub use validation::{validate_read_set, validate_scan_set, validate_transaction, ConflictType, ValidationResult};
