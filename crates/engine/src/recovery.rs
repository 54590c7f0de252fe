//! WAL replay
//!
//! On open, every valid WAL record is re-applied to a fresh storage in log
//! order, and the store version is set to the last replayed commit version.

use skudb_core::StoreResult;
use skudb_durability::{ReadStopReason, WalReadResult};
use skudb_storage::ShardedStore;
use tracing::{info, warn};

/// Summary of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records applied
    pub records_applied: usize,
    /// Document writes applied
    pub writes_applied: usize,
    /// Version after replay
    pub final_version: u64,
    /// Whether a torn or corrupt tail was found (and will be truncated)
    pub truncated_tail: bool,
}

/// Replay a WAL read result into `store`
///
/// Records whose version does not advance past the last applied one are
/// skipped: they can only come from a log written by an older process that
/// crashed mid-append and was never truncated.
pub fn replay_wal(result: &WalReadResult, store: &ShardedStore) -> StoreResult<RecoveryStats> {
    let mut stats = RecoveryStats::default();
    let mut last = store.current_version();

    for record in &result.records {
        if record.version <= last {
            warn!(
                version = record.version,
                last_applied = last,
                "skipping out-of-order WAL record"
            );
            continue;
        }
        store.apply(record.version, &record.writes);
        last = record.version;
        stats.records_applied += 1;
        stats.writes_applied += record.writes.len();
    }

    store.set_version(last);
    stats.final_version = last;
    stats.truncated_tail = !matches!(result.stop_reason, ReadStopReason::EndOfData);

    info!(
        records = stats.records_applied,
        writes = stats.writes_applied,
        version = stats.final_version,
        truncated_tail = stats.truncated_tail,
        "WAL replay complete"
    );
    Ok(stats)
}
