//! WAL writer with durability mode support.
//!
//! The writer appends one record per commit and syncs according to the
//! configured [`DurabilityMode`].
//!
//! A failed append leaves no trace in the log: the file is cut back to the
//! end of the last complete record before the error is returned, so a
//! record is on disk only if its commit is applied. If the cut itself
//! fails the writer is poisoned and refuses further appends.

use super::{DurabilityMode, WalError};
use crate::format::{WalRecord, WAL_HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// File operations the writer needs beyond `Write`.
pub(crate) trait LogFile: Write + Send {
    /// fsync the file contents
    fn sync_data(&mut self) -> io::Result<()>;

    /// Cut the file to `len` bytes and move the cursor there
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

/// Cumulative WAL operation counters.
///
/// These counters accumulate over the lifetime of the writer and are never
/// reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalCounters {
    /// Total records appended
    pub wal_appends: u64,
    /// Total fsync calls
    pub sync_calls: u64,
    /// Total bytes written (header excluded)
    pub bytes_written: u64,
    /// Total nanoseconds spent in fsync
    pub sync_nanos: u64,
}

/// WAL writer with configurable durability modes.
///
/// # Durability Modes
///
/// - `Cache`: no file; appends are no-ops
/// - `Buffered`: records are written on append, fsynced on `flush`
/// - `Always`: fsync after every record
pub struct WalWriter {
    /// Open WAL file (None when DurabilityMode::Cache)
    file: Option<Box<dyn LogFile>>,

    /// Path of the WAL file
    path: Option<PathBuf>,

    /// Durability mode
    durability: DurabilityMode,

    /// End of the last complete record
    position: u64,

    /// Whether there is data written but not yet fsynced
    has_unsynced_data: bool,

    /// Set when a failed append could not be rolled back
    poisoned: bool,

    counters: WalCounters,
}

impl WalWriter {
    /// Writer that logs nothing (Cache mode)
    pub fn disabled() -> Self {
        WalWriter {
            file: None,
            path: None,
            durability: DurabilityMode::Cache,
            position: 0,
            has_unsynced_data: false,
            poisoned: false,
            counters: WalCounters::default(),
        }
    }

    /// Open the WAL at `path` for appending.
    ///
    /// `valid_end` is the length of the valid prefix reported by the reader;
    /// anything after it (a torn tail) is cut off. A `valid_end` shorter
    /// than the header starts a fresh log.
    pub fn open(path: &Path, durability: DurabilityMode, valid_end: u64) -> Result<Self, WalError> {
        if !durability.requires_wal() {
            return Ok(Self::disabled());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        let existing = file.metadata()?.len();
        let position = if valid_end < WAL_HEADER_SIZE as u64 {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&WalRecord::header_bytes())?;
            file.sync_all()?;
            WAL_HEADER_SIZE as u64
        } else {
            if existing > valid_end {
                info!(
                    path = %path.display(),
                    dropped = existing - valid_end,
                    "truncating torn WAL tail"
                );
                file.set_len(valid_end)?;
                file.sync_all()?;
            }
            file.seek(SeekFrom::Start(valid_end))?;
            valid_end
        };

        debug!(path = %path.display(), position, mode = ?durability, "WAL opened");

        Ok(WalWriter {
            file: Some(Box::new(file)),
            path: Some(path.to_path_buf()),
            durability,
            position,
            has_unsynced_data: false,
            poisoned: false,
            counters: WalCounters::default(),
        })
    }

    /// Append one commit record.
    ///
    /// In `Always` mode the record is on stable storage when this returns.
    /// On error the log is exactly as it was before the call.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        if self.file.is_none() {
            return Ok(());
        }
        if self.poisoned {
            return Err(WalError::Poisoned);
        }

        let bytes = record.to_bytes()?;
        if let Err(e) = self.write_record(&bytes) {
            self.rollback();
            return Err(e);
        }

        self.position += bytes.len() as u64;
        self.counters.wal_appends += 1;
        self.counters.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<(), WalError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes)?;
            self.has_unsynced_data = true;
        }
        if self.durability.requires_immediate_fsync() {
            self.sync()?;
        }
        Ok(())
    }

    /// Cut the file back to the end of the last complete record.
    fn rollback(&mut self) {
        let position = self.position;
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let result = match file.truncate_to(position) {
            Ok(()) => file.sync_data(),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                self.has_unsynced_data = false;
                warn!(position, "WAL append failed, log rolled back");
            }
            Err(e) => {
                error!(position, error = %e, "WAL rollback failed, refusing further appends");
                self.poisoned = true;
            }
        }
    }

    /// fsync any unsynced data.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.has_unsynced_data {
            self.sync()?;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<(), WalError> {
        if let Some(file) = self.file.as_mut() {
            let start = Instant::now();
            file.sync_data()?;
            self.counters.sync_calls += 1;
            self.counters.sync_nanos += start.elapsed().as_nanos() as u64;
            self.has_unsynced_data = false;
        }
        Ok(())
    }

    /// Writer over an already-positioned log file
    #[cfg(test)]
    pub(crate) fn with_log_file(
        file: Box<dyn LogFile>,
        durability: DurabilityMode,
        position: u64,
    ) -> Self {
        WalWriter {
            file: Some(file),
            path: None,
            durability,
            position,
            has_unsynced_data: false,
            poisoned: false,
            counters: WalCounters::default(),
        }
    }

    /// Whether a failed rollback has disabled the writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Durability mode in effect
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Path of the WAL file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current end of the log in bytes
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Cumulative counters
    pub fn counters(&self) -> WalCounters {
        self.counters.clone()
    }
}
