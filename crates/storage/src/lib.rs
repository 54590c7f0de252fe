//! Storage layer for skudb
//!
//! This crate implements the in-memory MVCC document storage:
//! - VersionChain: per-document version history, newest first
//! - ShardedStore: DashMap of per-collection shards
//! - ShardedSnapshot: registered point-in-time view for transactions
//!
//! Writes are installed by the commit path only; everything else reads
//! through a snapshot. Old versions are pruned once no snapshot can see them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;
pub mod snapshot;

pub use sharded::{ShardedStore, StoredEntry, VersionChain};
pub use snapshot::ShardedSnapshot;
