//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking
//! - Transaction metrics (started, committed, aborted, conflicts)
//! - Idle waiting for shutdown

use skudb_concurrency::{CommitError, TransactionContext, TransactionManager};
use skudb_core::{OpContext, StoreResult};
use skudb_durability::WalCounters;
use skudb_storage::ShardedStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Transaction coordinator for the database
///
/// # Memory Ordering
///
/// The metric counters are purely observational and use Relaxed ordering.
pub struct TransactionCoordinator {
    /// Transaction manager for ID allocation and commit
    manager: TransactionManager,
    /// Active transaction count
    active_count: AtomicU64,
    /// Total transactions started
    total_started: AtomicU64,
    /// Total transactions committed
    total_committed: AtomicU64,
    /// Total transactions aborted (conflicts included)
    total_aborted: AtomicU64,
    /// Total commits rejected by conflict validation
    total_conflicts: AtomicU64,
}

impl TransactionCoordinator {
    /// Create a coordinator around a manager
    pub fn new(manager: TransactionManager) -> Self {
        Self {
            manager,
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
            total_conflicts: AtomicU64::new(0),
        }
    }

    /// Begin a transaction and count it as active
    pub fn start_transaction(&self, store: &Arc<ShardedStore>, ctx: OpContext) -> TransactionContext {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        self.manager.begin(store, ctx)
    }

    /// Commit a transaction, recording the outcome
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &ShardedStore,
    ) -> Result<u64, CommitError> {
        match self.manager.commit(txn, store) {
            Ok(version) => {
                self.record_commit();
                Ok(version)
            }
            Err(e) => {
                if matches!(e, CommitError::ValidationFailed(_)) {
                    self.total_conflicts.fetch_add(1, Ordering::Relaxed);
                }
                self.record_abort();
                Err(e)
            }
        }
    }

    /// Abort a transaction whose body failed
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) {
        self.manager.abort(txn, reason);
        self.record_abort();
    }

    fn finish(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }

    fn record_commit(&self) {
        self.finish();
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_abort(&self) {
        self.finish();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// fsync the WAL
    pub fn flush_wal(&self) -> StoreResult<()> {
        self.manager.flush_wal()
    }

    /// WAL counters
    pub fn wal_counters(&self) -> WalCounters {
        self.manager.wal_counters()
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            total_conflicts: self.total_conflicts.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }

    /// Get current active transaction count
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait for all active transactions to complete
    ///
    /// Returns false if `timeout` expired with transactions still active.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.active_count.load(Ordering::SeqCst) > 0 {
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

/// Transaction metrics
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Aborts caused by commit-time conflicts
    pub total_conflicts: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
