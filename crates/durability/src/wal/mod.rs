//! Write-ahead log
//!
//! The WAL is a single file, `skudb.wal`, inside the database directory:
//! an 8-byte header followed by one framed record per committed
//! transaction. See [`crate::format::wal_record`] for the byte layout.

mod mode;
mod reader;
mod writer;

pub use mode::DurabilityMode;
pub use reader::{ReadStopReason, WalReadResult, WalReader};
pub use writer::{WalCounters, WalWriter};

use crate::format::WalRecordError;
use skudb_core::StoreError;

/// File name of the WAL inside a database directory
pub const WAL_FILE_NAME: &str = "skudb.wal";

/// Errors raised while reading or writing the WAL
#[derive(Debug, thiserror::Error)]
pub enum WalError {
    /// Underlying file I/O failed
    #[error("WAL I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with a valid skudb WAL header
    #[error("Invalid WAL header: {0}")]
    InvalidHeader(String),

    /// A record could not be encoded
    #[error("WAL record error: {0}")]
    Record(#[from] WalRecordError),

    /// An earlier append failed and could not be rolled back
    #[error("WAL is unusable after a failed rollback")]
    Poisoned,
}

impl From<WalError> for StoreError {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(io) => StoreError::Io(io),
            WalError::InvalidHeader(msg) => StoreError::Corruption(msg),
            WalError::Record(err) => StoreError::Serialization(err.to_string()),
            WalError::Poisoned => StoreError::Unavailable(WalError::Poisoned.to_string()),
        }
    }
}
