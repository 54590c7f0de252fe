//! Binary on-disk formats
//!
//! - `wal_record`: WAL file header and per-commit record framing

pub mod wal_record;

pub use wal_record::{
    WalRecord, WalRecordError, WAL_FORMAT_VERSION, WAL_HEADER_SIZE, WAL_MAGIC,
    WAL_RECORD_FORMAT_VERSION,
};
