//! Transaction context for OCC
//!
//! A [`TransactionContext`] reads from a registered storage snapshot and
//! buffers its writes until commit. It tracks:
//! - `read_set`: every key read and the version observed (0 = never written)
//! - `scan_set`: every collection scanned and the snapshot version it was
//!   scanned at
//! - `writes`: at most one pending write per key
//!
//! # Ordering rules
//!
//! All reads must precede all writes. A read issued after the first
//! buffered write fails with `ReadAfterWrite`; the transaction runner treats
//! that as a bug in the body, not something to retry.

use crate::validation::ValidationResult;
use skudb_core::{
    DocKey, Document, DocumentOps, OpContext, Query, StoreError, StoreResult, StoredDoc,
};
use skudb_durability::WalError;
use skudb_storage::ShardedSnapshot;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Error type for commit failures
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// Transaction aborted due to validation conflicts
    #[error("Commit failed: {} conflict(s)", .0.conflict_count())]
    ValidationFailed(ValidationResult),

    /// Transaction was not in correct state for commit
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// WAL write failed; nothing was applied
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    /// Precondition failure or cancelled context
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CommitError> for StoreError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => StoreError::Conflict {
                reason: result.describe(),
            },
            CommitError::InvalidState(msg) => StoreError::InvalidOperation(msg),
            CommitError::Wal(err) => err.into(),
            CommitError::Store(err) => err,
        }
    }
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (validation passed)
/// - `Validating` → `Aborted` (conflict or precondition failure)
/// - `Active` → `Aborted` (body error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Requirement on a document's committed state, checked at commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must not exist (create)
    MustNotExist,
    /// The document must exist (update)
    MustExist,
}

/// A buffered write
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Create a new document
    Create(Document),
    /// Create or overwrite
    Set(Document),
    /// Merge top-level fields into an existing document
    Update(Document),
    /// Remove the document
    Delete,
}

impl PendingWrite {
    /// Precondition this write carries, if any
    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            PendingWrite::Create(_) => Some(Precondition::MustNotExist),
            PendingWrite::Update(_) => Some(Precondition::MustExist),
            PendingWrite::Set(_) | PendingWrite::Delete => None,
        }
    }

    /// Final document body given the latest committed body
    ///
    /// Fails when the precondition does not hold against `current`.
    pub fn resolve(&self, key: &DocKey, current: Option<&Document>) -> StoreResult<Option<Document>> {
        match self {
            PendingWrite::Create(doc) => match current {
                Some(_) => Err(StoreError::AlreadyExists(key.clone())),
                None => Ok(Some(doc.clone())),
            },
            PendingWrite::Set(doc) => Ok(Some(doc.clone())),
            PendingWrite::Update(fields) => match current {
                Some(existing) => {
                    let mut merged = existing.clone();
                    for (name, value) in fields {
                        merged.insert(name.clone(), value.clone());
                    }
                    Ok(Some(merged))
                }
                None => Err(StoreError::NotFound(key.clone())),
            },
            PendingWrite::Delete => Ok(None),
        }
    }
}

/// Transaction context for OCC
///
/// # Lifecycle
///
/// 1. **BEGIN**: created by `TransactionManager::begin`, status `Active`
/// 2. **READ/WRITE**: `get()` / `query()` then `create()` / `set()` /
///    `update()` / `delete()`
/// 3. **COMMIT/ABORT**: `TransactionManager::commit` or `abort`
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Version at transaction start (snapshot version)
    pub start_version: u64,

    /// Keys read and the version of the entry observed
    ///
    /// Version 0 means the key had never been written when read.
    pub read_set: HashMap<DocKey, u64>,

    /// Collections scanned and the snapshot version of the scan
    pub scan_set: HashMap<String, u64>,

    /// Buffered writes, at most one per key
    pub writes: BTreeMap<DocKey, PendingWrite>,

    /// Current transaction status
    pub status: TransactionStatus,

    snapshot: ShardedSnapshot,
    ctx: OpContext,
    start_time: Instant,
}

impl TransactionContext {
    /// Create a transaction reading from `snapshot`
    pub fn new(txn_id: u64, snapshot: ShardedSnapshot, ctx: OpContext) -> Self {
        TransactionContext {
            txn_id,
            start_version: snapshot.version(),
            read_set: HashMap::new(),
            scan_set: HashMap::new(),
            writes: BTreeMap::new(),
            status: TransactionStatus::Active,
            snapshot,
            ctx,
            start_time: Instant::now(),
        }
    }

    /// Operation context this transaction runs under
    pub fn context(&self) -> &OpContext {
        &self.ctx
    }

    fn before_read(&self, key: Option<&DocKey>) -> StoreResult<()> {
        self.ensure_active()?;
        self.ctx.check()?;
        if let Some((first, _)) = self.writes.iter().next() {
            return Err(StoreError::ReadAfterWrite(
                key.cloned().unwrap_or_else(|| first.clone()),
            ));
        }
        Ok(())
    }

    fn stage(&mut self, key: &DocKey, write: PendingWrite) -> StoreResult<()> {
        self.ensure_active()?;
        self.ctx.check()?;
        if self.writes.contains_key(key) {
            return Err(StoreError::InvalidOperation(format!(
                "{} already written in transaction {}",
                key, self.txn_id
            )));
        }
        self.writes.insert(key.clone(), write);
        Ok(())
    }

    // === State Management ===

    /// Check if transaction is in Active state
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Whether the transaction has no buffered writes
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if transaction can accept operations
    pub fn ensure_active(&self) -> StoreResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StoreError::InvalidOperation(format!(
                "Transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Transition `Active` → `Validating`
    pub fn mark_validating(&mut self) -> Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "Cannot commit transaction {} from state {:?}",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;
        Ok(())
    }

    /// Transition `Validating` → `Committed`
    pub fn mark_committed(&mut self) -> Result<(), CommitError> {
        match self.status {
            TransactionStatus::Validating => {
                self.status = TransactionStatus::Committed;
                Ok(())
            }
            _ => Err(CommitError::InvalidState(format!(
                "Cannot commit transaction {} from state {:?}",
                self.txn_id, self.status
            ))),
        }
    }

    /// Abort unless already terminal
    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        if matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Validating
        ) {
            self.status = TransactionStatus::Aborted {
                reason: reason.into(),
            };
        }
    }

    /// Abort reason, if aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }
}

impl DocumentOps for TransactionContext {
    fn get(&mut self, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        self.before_read(Some(key))?;
        let observed = self.snapshot.observed_version(key);
        self.read_set.insert(key.clone(), observed);
        Ok(self.snapshot.get(key))
    }

    fn create(&mut self, key: &DocKey, doc: Document) -> StoreResult<()> {
        if self.snapshot.contains(key) {
            self.ensure_active()?;
            return Err(StoreError::AlreadyExists(key.clone()));
        }
        self.stage(key, PendingWrite::Create(doc))
    }

    fn set(&mut self, key: &DocKey, doc: Document) -> StoreResult<()> {
        self.stage(key, PendingWrite::Set(doc))
    }

    fn update(&mut self, key: &DocKey, fields: Document) -> StoreResult<()> {
        self.stage(key, PendingWrite::Update(fields))
    }

    fn delete(&mut self, key: &DocKey) -> StoreResult<()> {
        self.stage(key, PendingWrite::Delete)
    }

    fn query(&mut self, query: &Query) -> StoreResult<Vec<StoredDoc>> {
        self.before_read(None)?;
        self.scan_set
            .insert(query.collection.clone(), self.snapshot.version());
        Ok(query.evaluate(self.snapshot.scan(&query.collection)))
    }
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("reads", &self.read_set.len())
            .field("scans", &self.scan_set.len())
            .field("writes", &self.writes.len())
            .field("status", &self.status)
            .finish()
    }
}
