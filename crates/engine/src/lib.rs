//! Database engine for skudb
//!
//! This crate orchestrates all lower layers:
//! - Database: open/close, configuration, shutdown
//! - Transaction coordination and metrics
//! - Conflict retry with backoff
//! - WAL replay on open
//!
//! `Database` is the crate's [`DocumentStore`](skudb_core::DocumentStore)
//! implementation: the catalog layer talks to it only through that trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;
pub mod recovery;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use database::{Database, RetryConfig, StoreConfig, CONFIG_FILE_NAME};
pub use recovery::{replay_wal, RecoveryStats};
