//! Durability mode configuration
//!
//! Controls WAL sync behavior (Cache, Buffered, Always).

use serde::{Deserialize, Serialize};

/// Durability mode for WAL operations
///
/// # Modes
///
/// | Mode | WAL file | fsync | Data Loss Window |
/// |------|----------|-------|-----------------|
/// | Cache | No | Never | Everything |
/// | Buffered | Yes | On flush/shutdown | OS crash only |
/// | Always | Yes | Every commit | Zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// In-memory only; no WAL file is created
    ///
    /// Use case: tests, ephemeral catalogs.
    Cache,

    /// Records are written to the WAL file on commit and left to the OS
    /// page cache; fsync happens on explicit flush and at shutdown.
    ///
    /// Survives a process crash, not a power loss.
    #[default]
    Buffered,

    /// fsync after every commit (slow, maximum durability)
    Always,
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence
    ///
    /// Returns false for Cache mode, true for all others.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::Cache)
    }

    /// Check if this mode requires immediate fsync on every commit
    ///
    /// Returns true only for Always mode.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Cache => "Cache (no WAL, all data lost on exit)",
            DurabilityMode::Buffered => "Buffered (WAL without per-commit fsync)",
            DurabilityMode::Always => "Always sync (safest, slowest)",
        }
    }
}
