//! Error types for skudb stores
//!
//! Every store implementation reports failures through [`StoreError`].
//! The variants mirror the status codes a transactional document store
//! hands back: callers branch on `AlreadyExists` / `NotFound` /
//! `Conflict` and propagate everything else.

use crate::types::DocKey;
use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types reported by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Update target does not exist
    #[error("Document not found: {0}")]
    NotFound(DocKey),

    /// Create target already exists
    #[error("Document already exists: {0}")]
    AlreadyExists(DocKey),

    /// Transaction lost a first-committer-wins race
    ///
    /// Retried automatically by the store's transaction runner.
    #[error("Transaction conflict: {reason}")]
    Conflict {
        /// Human-readable description of the conflicting keys
        reason: String,
    },

    /// A read was issued after the transaction had staged a write
    #[error("Read of {0} after a write in the same transaction")]
    ReadAfterWrite(DocKey),

    /// Operation is not valid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Document body could not be encoded or decoded
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Caller's deadline passed before the operation finished
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Store is shut down or otherwise not accepting work
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// I/O error (WAL, config file)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persistent state is damaged
    #[error("Data corruption: {0}")]
    Corruption(String),
}

impl StoreError {
    /// True for conflicts the transaction runner should retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// True when a create found its target already present
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    /// True when an update target was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Build a conflict error
    pub fn conflict(reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
