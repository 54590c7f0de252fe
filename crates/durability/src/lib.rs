//! Durability layer for skudb
//!
//! This crate handles everything that touches disk:
//!
//! - WAL: single append-only log file with one record per committed transaction
//! - Durability modes: Cache, Buffered (default), Always
//! - Record framing with CRC32 checksums and torn-tail detection on read
//!
//! Replaying records into storage is the engine's job; this crate only
//! produces and parses them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format; // On-disk record and header layout
pub mod wal; // WAL writer, reader, durability modes

pub use format::{WalRecord, WalRecordError, WAL_HEADER_SIZE, WAL_MAGIC, WAL_RECORD_FORMAT_VERSION};
pub use wal::{
    DurabilityMode, ReadStopReason, WalCounters, WalError, WalReadResult, WalReader, WalWriter,
    WAL_FILE_NAME,
};
