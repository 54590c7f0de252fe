//! Transaction validation for OCC
//!
//! Conflict detection runs inside the commit section, against the latest
//! committed state:
//! - First-committer-wins based on the READ-SET and SCAN-SET
//! - Blind writes (write without read) do NOT conflict
//! - Preconditions (create / update) are checked separately when writes are
//!   resolved, and fail with `AlreadyExists` / `NotFound` rather than a
//!   retryable conflict

use crate::transaction::TransactionContext;
use skudb_core::DocKey;
use skudb_storage::ShardedStore;
use std::collections::HashMap;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Read-write conflict: key was read at one version but current version differs
    ReadWriteConflict {
        /// The key that has a conflict
        key: DocKey,
        /// Version recorded in read_set when read
        read_version: u64,
        /// Current version in storage at validation time
        current_version: u64,
    },

    /// Scan conflict: a commit wrote into a scanned collection after the scan
    ScanConflict {
        /// Collection that was scanned
        collection: String,
        /// Snapshot version of the scan
        scan_version: u64,
        /// Collection write version at validation time
        current_version: u64,
    },
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// One-line description naming the conflicting keys and collections
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .conflicts
            .iter()
            .map(|c| match c {
                ConflictType::ReadWriteConflict {
                    key,
                    read_version,
                    current_version,
                } => format!("{} read at v{} now v{}", key, read_version, current_version),
                ConflictType::ScanConflict {
                    collection,
                    scan_version,
                    current_version,
                } => format!(
                    "collection {} scanned at v{} written at v{}",
                    collection, scan_version, current_version
                ),
            })
            .collect();
        parts.join("; ")
    }
}

/// Validate the read-set against current storage state
///
/// For each key read, the version of its newest committed entry must still
/// equal the version the transaction observed.
pub fn validate_read_set(read_set: &HashMap<DocKey, u64>, store: &ShardedStore) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (key, read_version) in read_set {
        let current_version = store.latest_version(key);
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version: *read_version,
                current_version,
            });
        }
    }

    result
}

/// Validate the scan-set against current storage state
///
/// Any commit into a scanned collection after the scan's snapshot is a
/// conflict, whatever it changed.
pub fn validate_scan_set(scan_set: &HashMap<String, u64>, store: &ShardedStore) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (collection, scan_version) in scan_set {
        let current_version = store.collection_version(collection);
        if current_version > *scan_version {
            result.conflicts.push(ConflictType::ScanConflict {
                collection: collection.clone(),
                scan_version: *scan_version,
                current_version,
            });
        }
    }

    result
}

/// Validate a transaction for commit
pub fn validate_transaction(txn: &TransactionContext, store: &ShardedStore) -> ValidationResult {
    let mut result = validate_read_set(&txn.read_set, store);
    result.merge(validate_scan_set(&txn.scan_set, store));
    result
}
