//! WAL reader for recovery and replay.
//!
//! Reads every record of the WAL file in order and stops at the first
//! record that is incomplete or fails its checksum. The reported
//! `valid_end` is where a writer should truncate the file before appending.

use super::WalError;
use crate::format::{WalRecord, WalRecordError, WAL_HEADER_SIZE};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::warn;

/// Why reading stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Every byte was consumed by a valid record
    EndOfData,
    /// The file ends in the middle of a record (torn write)
    PartialRecord {
        /// Byte offset of the partial record
        offset: u64,
    },
    /// A record failed its checksum or could not be parsed
    Corrupted {
        /// Byte offset of the bad record
        offset: u64,
        /// Parse error
        error: WalRecordError,
    },
}

/// Outcome of reading a WAL file
#[derive(Debug, Clone)]
pub struct WalReadResult {
    /// Valid records in file order
    pub records: Vec<WalRecord>,
    /// Byte length of the valid prefix (header included; 0 if no valid header)
    pub valid_end: u64,
    /// Why reading stopped
    pub stop_reason: ReadStopReason,
}

impl WalReadResult {
    fn empty() -> Self {
        WalReadResult {
            records: Vec::new(),
            valid_end: 0,
            stop_reason: ReadStopReason::EndOfData,
        }
    }

    /// Highest commit version among the records (0 if none)
    pub fn last_version(&self) -> u64 {
        self.records.iter().map(|r| r.version).max().unwrap_or(0)
    }
}

/// WAL reader
pub struct WalReader;

impl WalReader {
    /// Read all valid records from the WAL at `path`.
    ///
    /// A missing file, or one too short to hold a header, reads as empty.
    /// A file with a foreign header is an error: it is not ours to truncate.
    pub fn read_all(path: &Path) -> Result<WalReadResult, WalError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(WalReadResult::empty()),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::read_bytes(&buffer)
    }

    /// Parse an in-memory WAL image.
    pub fn read_bytes(buffer: &[u8]) -> Result<WalReadResult, WalError> {
        if buffer.len() < WAL_HEADER_SIZE {
            return Ok(WalReadResult::empty());
        }
        WalRecord::check_header(&buffer[..WAL_HEADER_SIZE])
            .map_err(|e| WalError::InvalidHeader(e.to_string()))?;

        let mut records = Vec::new();
        let mut offset = WAL_HEADER_SIZE;
        let mut stop_reason = ReadStopReason::EndOfData;

        while offset < buffer.len() {
            match WalRecord::from_bytes(&buffer[offset..]) {
                Ok((record, consumed)) => {
                    records.push(record);
                    offset += consumed;
                }
                Err(WalRecordError::InsufficientData) => {
                    warn!(offset, "WAL ends with a partial record");
                    stop_reason = ReadStopReason::PartialRecord {
                        offset: offset as u64,
                    };
                    break;
                }
                Err(error) => {
                    warn!(offset, %error, "WAL record is corrupted, ignoring the rest of the log");
                    stop_reason = ReadStopReason::Corrupted {
                        offset: offset as u64,
                        error,
                    };
                    break;
                }
            }
        }

        Ok(WalReadResult {
            records,
            valid_end: offset as u64,
            stop_reason,
        })
    }
}
