//! Database handle
//!
//! A [`Database`] owns the MVCC storage, the transaction coordinator and
//! (for on-disk databases) the WAL. It is opened either in memory with
//! [`Database::ephemeral`] or from a data directory with [`Database::open`],
//! which reads `skudb.toml`, replays `skudb.wal` and truncates any torn tail.
//!
//! ## Transactions
//!
//! - [`Database::transaction`] runs a body once and commits it
//! - [`Database::transaction_with_retry`] re-runs the body on commit
//!   conflicts, with exponential backoff and jitter
//! - `DocumentStore::run_transaction` is `transaction_with_retry` with the
//!   configured [`RetryConfig`]
//!
//! Errors returned by a body abort the attempt and are handed back
//! unchanged; they are never retried.

mod config;
mod transactions;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use transactions::RetryConfig;

use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::recovery::{replay_wal, RecoveryStats};
use skudb_concurrency::{TransactionContext, TransactionManager};
use skudb_core::{
    DocKey, Document, DocumentOps, DocumentStore, OpContext, Query, StoreError, StoreResult,
    StoredDoc,
};
use skudb_durability::{WalReader, WalWriter, WAL_FILE_NAME};
use skudb_storage::ShardedStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long shutdown waits for in-flight transactions
const SHUTDOWN_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one transaction attempt
enum Attempt<T, E> {
    Committed(T),
    BodyFailed(E),
    CommitFailed(StoreError),
}

/// Transactional document database
pub struct Database {
    storage: Arc<ShardedStore>,
    coordinator: TransactionCoordinator,
    config: StoreConfig,
    data_dir: Option<PathBuf>,
    recovery: RecoveryStats,
    accepting_transactions: AtomicBool,
}

impl Database {
    /// In-memory database with the default retry policy
    pub fn ephemeral() -> Self {
        Self::ephemeral_with_config(StoreConfig::ephemeral())
    }

    /// In-memory database; the durability setting is ignored
    pub fn ephemeral_with_config(config: StoreConfig) -> Self {
        let config = StoreConfig {
            durability: skudb_durability::DurabilityMode::Cache,
            ..config
        };
        Database {
            storage: Arc::new(ShardedStore::new()),
            coordinator: TransactionCoordinator::new(TransactionManager::new(
                WalWriter::disabled(),
            )),
            config,
            data_dir: None,
            recovery: RecoveryStats::default(),
            accepting_transactions: AtomicBool::new(true),
        }
    }

    /// Open (or create) a database in `dir`
    ///
    /// Writes a default `skudb.toml` if the directory has none.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&config_path)?;
        let config = StoreConfig::from_file(&config_path)?;
        Self::open_with_config(dir, config)
    }

    /// Open (or create) a database in `dir` with an explicit configuration
    ///
    /// The config file in `dir`, if any, is not consulted.
    pub fn open_with_config(dir: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let storage = Arc::new(ShardedStore::new());
        let (wal, recovery) = if config.durability.requires_wal() {
            let wal_path = dir.join(WAL_FILE_NAME);
            let read = WalReader::read_all(&wal_path)?;
            let stats = replay_wal(&read, &storage)?;
            let writer = WalWriter::open(&wal_path, config.durability, read.valid_end)?;
            (writer, stats)
        } else {
            (WalWriter::disabled(), RecoveryStats::default())
        };

        info!(
            path = %dir.display(),
            durability = config.durability.description(),
            version = storage.current_version(),
            "database opened"
        );

        Ok(Database {
            storage,
            coordinator: TransactionCoordinator::new(TransactionManager::new(wal)),
            config,
            data_dir: Some(dir.to_path_buf()),
            recovery,
            accepting_transactions: AtomicBool::new(true),
        })
    }

    /// Data directory (None for ephemeral databases)
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Configuration in effect
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// What WAL replay did at open
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    /// Underlying storage
    pub fn storage(&self) -> &Arc<ShardedStore> {
        &self.storage
    }

    /// Last committed version
    pub fn current_version(&self) -> u64 {
        self.storage.current_version()
    }

    /// Transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Whether the database still accepts work
    pub fn is_open(&self) -> bool {
        self.accepting_transactions.load(Ordering::SeqCst)
    }

    /// Stop accepting work, wait for in-flight transactions, flush the WAL
    ///
    /// Later operations fail with `Unavailable`. Calling twice is harmless.
    pub fn shutdown(&self) -> StoreResult<()> {
        if !self.accepting_transactions.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.coordinator.wait_for_idle(SHUTDOWN_IDLE_TIMEOUT) {
            warn!(
                active = self.coordinator.active_count(),
                "shutting down with transactions still active"
            );
        }
        self.coordinator.flush_wal()?;
        info!(version = self.current_version(), "database shut down");
        Ok(())
    }

    fn check_accepting(&self) -> StoreResult<()> {
        if !self.is_open() {
            return Err(StoreError::Unavailable(
                "database is shut down".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Manual transaction control
    // ========================================================================

    /// Begin a transaction on a fresh snapshot
    ///
    /// Must be finished with `commit_transaction` or `abort_transaction`.
    pub fn begin_transaction(&self, ctx: &OpContext) -> StoreResult<TransactionContext> {
        self.check_accepting()?;
        ctx.check()?;
        Ok(self.coordinator.start_transaction(&self.storage, ctx.clone()))
    }

    /// Commit a transaction, returning its commit version
    pub fn commit_transaction(&self, txn: &mut TransactionContext) -> StoreResult<u64> {
        self.coordinator
            .commit(txn, &self.storage)
            .map_err(StoreError::from)
    }

    /// Abort a transaction; its writes are discarded
    pub fn abort_transaction(&self, txn: &mut TransactionContext, reason: impl Into<String>) {
        self.coordinator.abort(txn, reason);
    }

    // ========================================================================
    // Closure transactions
    // ========================================================================

    fn run_single_attempt<T, E, F>(&self, ctx: &OpContext, f: &mut F) -> Attempt<T, E>
    where
        F: FnMut(&mut TransactionContext) -> Result<T, E>,
    {
        let mut txn = match self.begin_transaction(ctx) {
            Ok(txn) => txn,
            Err(e) => return Attempt::CommitFailed(e),
        };
        match f(&mut txn) {
            Ok(value) => match self.commit_transaction(&mut txn) {
                Ok(_) => Attempt::Committed(value),
                Err(e) => Attempt::CommitFailed(e),
            },
            Err(e) => {
                self.abort_transaction(&mut txn, "transaction body returned an error");
                Attempt::BodyFailed(e)
            }
        }
    }

    /// Execute a transaction once
    ///
    /// Commits if `f` succeeds, aborts if it fails. A commit conflict is
    /// returned as `StoreError::Conflict` converted into `E`.
    pub fn transaction<T, E, F>(&self, ctx: &OpContext, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut f = Some(f);
        let mut once = |txn: &mut TransactionContext| match f.take() {
            Some(f) => f(txn),
            None => Err(E::from(StoreError::InvalidOperation(
                "transaction body invoked twice".to_string(),
            ))),
        };
        match self.run_single_attempt(ctx, &mut once) {
            Attempt::Committed(value) => Ok(value),
            Attempt::BodyFailed(e) => Err(e),
            Attempt::CommitFailed(e) => Err(E::from(e)),
        }
    }

    /// Execute a transaction with automatic retry on conflict
    ///
    /// The closure is called repeatedly until either:
    /// - The transaction commits successfully
    /// - The body or the commit fails with anything but a conflict
    /// - `config.max_retries` retries have failed
    ///
    /// Backoff sleeps never run past the context's deadline.
    pub fn transaction_with_retry<T, E, F>(
        &self,
        ctx: &OpContext,
        config: &RetryConfig,
        mut f: F,
    ) -> Result<T, E>
    where
        F: FnMut(&mut TransactionContext) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut attempt = 0;
        loop {
            match self.run_single_attempt(ctx, &mut f) {
                Attempt::Committed(value) => return Ok(value),
                Attempt::BodyFailed(e) => return Err(e),
                Attempt::CommitFailed(e) if e.is_conflict() && attempt < config.max_retries => {
                    let mut delay = config.jittered_delay(attempt);
                    if let Some(remaining) = ctx.remaining() {
                        delay = delay.min(remaining);
                    }
                    debug!(attempt, delay_us = delay.as_micros() as u64, error = %e, "retrying conflicted transaction");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Attempt::CommitFailed(e) => {
                    if e.is_conflict() {
                        warn!(retries = attempt, error = %e, "transaction retries exhausted");
                    }
                    return Err(E::from(e));
                }
            }
        }
    }
}

impl DocumentStore for Database {
    type Txn = TransactionContext;

    fn run_transaction<T, E, F>(&self, ctx: &OpContext, body: F) -> Result<T, E>
    where
        F: FnMut(&mut Self::Txn) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.transaction_with_retry(ctx, &self.config.retry, body)
    }

    fn get(&self, ctx: &OpContext, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        self.check_accepting()?;
        ctx.check()?;
        Ok(self.storage.snapshot().get(key))
    }

    fn create(&self, ctx: &OpContext, key: &DocKey, doc: Document) -> StoreResult<()> {
        self.run_transaction(ctx, |txn| txn.create(key, doc.clone()))
    }

    fn set(&self, ctx: &OpContext, key: &DocKey, doc: Document) -> StoreResult<()> {
        self.run_transaction(ctx, |txn| txn.set(key, doc.clone()))
    }

    fn update(&self, ctx: &OpContext, key: &DocKey, fields: Document) -> StoreResult<()> {
        self.run_transaction(ctx, |txn| txn.update(key, fields.clone()))
    }

    fn delete(&self, ctx: &OpContext, key: &DocKey) -> StoreResult<()> {
        self.run_transaction(ctx, |txn| txn.delete(key))
    }

    fn query(&self, ctx: &OpContext, query: &Query) -> StoreResult<Vec<StoredDoc>> {
        self.check_accepting()?;
        ctx.check()?;
        let snapshot = self.storage.snapshot();
        Ok(query.evaluate(snapshot.scan(&query.collection)))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.coordinator.flush_wal() {
                warn!(error = %e, "failed to flush WAL on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(m) => m,
            _ => Document::new(),
        }
    }

    #[test]
    fn test_transaction_commits_body_result() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        let key = DocKey::new("items", "a");
        let out: StoreResult<&str> = db.transaction(&ctx, |txn| {
            txn.create(&key, doc(json!({"sku": 1000})))?;
            Ok("done")
        });
        assert_eq!(out.unwrap(), "done");
        assert_eq!(
            db.get(&ctx, &key).unwrap().unwrap().field("sku"),
            Some(&json!(1000))
        );
        assert_eq!(db.metrics().total_committed, 1);
    }

    #[test]
    fn test_body_error_aborts_and_is_returned_unchanged() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        let key = DocKey::new("items", "a");
        let calls = AtomicUsize::new(0);
        let out: StoreResult<()> = db.transaction_with_retry(&ctx, &RetryConfig::default(), |txn| {
            calls.fetch_add(1, Ordering::SeqCst);
            txn.set(&key, Document::new())?;
            Err(StoreError::InvalidDocument("nope".into()))
        });
        assert!(matches!(out, Err(StoreError::InvalidDocument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(db.get(&ctx, &key).unwrap().is_none());
        assert_eq!(db.metrics().total_aborted, 1);
    }

    #[test]
    fn test_conflict_is_retried_until_commit() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        let counter = DocKey::new("util", "Next$SKU");
        db.create(&ctx, &counter, doc(json!({"next": 1000}))).unwrap();

        let attempts = AtomicUsize::new(0);
        let taken: StoreResult<i64> = db.transaction_with_retry(&ctx, &RetryConfig::default(), |txn| {
            let n = txn
                .get(&counter)?
                .and_then(|d| d.field("next").and_then(|v| v.as_i64()))
                .unwrap_or_default();
            // First attempt races with a concurrent commit of the counter
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                db.set(&ctx, &counter, doc(json!({"next": n + 50}))).unwrap();
            }
            txn.update(&counter, doc(json!({"next": n + 1})))?;
            Ok(n)
        });

        assert_eq!(taken.unwrap(), 1050);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(db.metrics().total_conflicts, 1);
    }

    #[test]
    fn test_no_retry_surfaces_conflict() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        let key = DocKey::new("util", "c");
        let out: StoreResult<()> = db.transaction_with_retry(&ctx, &RetryConfig::no_retry(), |txn| {
            txn.get(&key)?;
            db.set(&ctx, &key, Document::new()).unwrap();
            txn.set(&key, Document::new())
        });
        assert!(out.unwrap_err().is_conflict());
    }

    #[test]
    fn test_create_existing_reports_already_exists() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        let key = DocKey::new("items", "a");
        db.create(&ctx, &key, Document::new()).unwrap();
        assert!(db.create(&ctx, &key, Document::new()).unwrap_err().is_already_exists());
        assert!(db
            .update(&ctx, &DocKey::new("items", "b"), Document::new())
            .unwrap_err()
            .is_not_found());
        db.delete(&ctx, &key).unwrap();
        db.delete(&ctx, &key).unwrap();
        assert!(db.get(&ctx, &key).unwrap().is_none());
    }

    #[test]
    fn test_expired_context_stops_before_work() {
        let db = Database::ephemeral();
        let ctx = OpContext::with_deadline(Instant::now() - Duration::from_millis(1));
        let err = db
            .set(&ctx, &DocKey::new("items", "a"), Document::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::DeadlineExceeded));
        assert_eq!(db.current_version(), 0);
    }

    #[test]
    fn test_shutdown_rejects_new_work() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        db.shutdown().unwrap();
        db.shutdown().unwrap();
        assert!(!db.is_open());
        assert!(matches!(
            db.get(&ctx, &DocKey::new("items", "a")),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            db.set(&ctx, &DocKey::new("items", "a"), Document::new()),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_query_uses_snapshot() {
        let db = Database::ephemeral();
        let ctx = OpContext::background();
        for (id, sku) in [("b", 1001), ("a", 1000), ("c", 1002)] {
            db.create(&ctx, &DocKey::new("items", id), doc(json!({"sku": sku})))
                .unwrap();
        }
        let hits = db
            .query(&ctx, &Query::collection("items").where_eq("sku", 1001))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key.id, "b");
        assert_eq!(db.query(&ctx, &Query::collection("items")).unwrap().len(), 3);
    }
}
