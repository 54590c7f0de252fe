//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. WAL writing (durability)
//! 3. Storage application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. mark_validating()        Active → Validating
//! 2. enter commit section     (serializes all writing commits)
//! 3. validate_transaction()   read-set / scan-set conflicts
//! 4. resolve writes           preconditions + update merges vs latest state
//! 5. allocate commit_version  current_version + 1
//! 6. append WAL record        DURABILITY POINT
//! 7. apply to storage         publishes commit_version
//! 8. mark_committed()
//! ```
//!
//! Read-only transactions skip steps 2-7: their snapshot was consistent
//! when taken.

use crate::transaction::{CommitError, TransactionContext};
use crate::validation::validate_transaction;
use parking_lot::Mutex;
use skudb_core::{OpContext, ResolvedWrite, StoreResult};
use skudb_durability::{WalCounters, WalError, WalRecord, WalWriter};
use skudb_storage::ShardedStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Commits between garbage collection passes
const DEFAULT_GC_INTERVAL: u64 = 64;

/// State owned by the commit section
struct CommitState {
    wal: WalWriter,
    commits_since_gc: u64,
}

/// Manages transaction lifecycle and atomic commits
///
/// The commit section is a mutex around the WAL writer: holding it is what
/// makes validate + apply atomic with respect to other commits.
pub struct TransactionManager {
    state: Mutex<CommitState>,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    gc_interval: u64,
}

impl TransactionManager {
    /// Create a manager that logs commits to `wal`
    pub fn new(wal: WalWriter) -> Self {
        TransactionManager {
            state: Mutex::new(CommitState {
                wal,
                commits_since_gc: 0,
            }),
            next_txn_id: AtomicU64::new(1),
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }

    /// Run garbage collection every `interval` writing commits (min 1)
    pub fn with_gc_interval(mut self, interval: u64) -> Self {
        self.gc_interval = interval.max(1);
        self
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Begin a transaction on a fresh snapshot
    pub fn begin(&self, store: &Arc<ShardedStore>, ctx: OpContext) -> TransactionContext {
        TransactionContext::new(self.next_txn_id(), store.snapshot(), ctx)
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// - Ok(commit_version) on success; read-only transactions return their
    ///   snapshot version
    /// - Err(CommitError) if validation, a precondition, or the WAL fails.
    ///   The transaction is left `Aborted` and nothing was applied.
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &ShardedStore,
    ) -> Result<u64, CommitError> {
        txn.mark_validating()?;

        if txn.is_read_only() {
            txn.mark_committed()?;
            return Ok(txn.start_version);
        }

        let mut state = self.state.lock();

        let outcome = Self::validate_and_resolve(txn, store);
        let resolved = match outcome {
            Ok(resolved) => resolved,
            Err(e) => {
                txn.mark_aborted(e.to_string());
                return Err(e);
            }
        };

        let commit_version = store.current_version() + 1;

        if let Err(e) = state
            .wal
            .append(&WalRecord::new(commit_version, resolved.clone()))
        {
            error!(
                txn_id = txn.txn_id,
                commit_version,
                error = %e,
                "WAL append failed, transaction not applied"
            );
            txn.mark_aborted(format!("WAL write failed: {}", e));
            return Err(CommitError::Wal(e));
        }

        store.apply(commit_version, &resolved);
        txn.mark_committed()?;

        state.commits_since_gc += 1;
        if state.commits_since_gc >= self.gc_interval {
            state.commits_since_gc = 0;
            store.gc();
        }

        debug!(
            txn_id = txn.txn_id,
            commit_version,
            writes = resolved.len(),
            "transaction committed"
        );
        Ok(commit_version)
    }

    fn validate_and_resolve(
        txn: &TransactionContext,
        store: &ShardedStore,
    ) -> Result<Vec<ResolvedWrite>, CommitError> {
        txn.context().check()?;

        let validation = validate_transaction(txn, store);
        if !validation.is_valid() {
            return Err(CommitError::ValidationFailed(validation));
        }

        let mut resolved = Vec::with_capacity(txn.writes.len());
        for (key, write) in &txn.writes {
            let latest = store.latest(key).and_then(|e| e.doc);
            let doc = write.resolve(key, latest.as_deref())?;
            // Deleting an absent document is a successful no-op
            if doc.is_none() && latest.is_none() {
                continue;
            }
            resolved.push(ResolvedWrite {
                key: key.clone(),
                doc,
            });
        }
        Ok(resolved)
    }

    /// Explicitly abort a transaction
    ///
    /// Buffered writes are discarded; nothing reaches the WAL or storage.
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) {
        txn.mark_aborted(reason);
    }

    /// fsync the WAL
    pub fn flush_wal(&self) -> StoreResult<()> {
        self.state.lock().wal.flush().map_err(|e: WalError| e.into())
    }

    /// WAL counters
    pub fn wal_counters(&self) -> WalCounters {
        self.state.lock().wal.counters()
    }
}
