//! Sharded document storage
//!
//! Documents are partitioned by collection: one DashMap entry per
//! collection, each holding a plain HashMap of version chains keyed by
//! document id. Reads of different collections never contend, and a
//! collection scan walks a single shard.
//!
//! # Versions
//!
//! Every committed transaction gets one version number. All documents it
//! touches get a chain entry at that version, and the collection shard
//! records it as its last write version. The store-wide version is
//! published only after all entries are installed, so a snapshot taken at
//! version `v` sees either all or none of the writes of version `v`.
//!
//! # Garbage collection
//!
//! [`ShardedStore::gc`] prunes entries no registered snapshot can observe.
//! A chain always keeps its newest entry at or below the cutoff, since that
//! is the entry the oldest snapshot reads.

use dashmap::DashMap;
use parking_lot::Mutex;
use skudb_core::{DocKey, Document, ResolvedWrite, StoredDoc};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::snapshot::ShardedSnapshot;

/// One entry of a version chain
///
/// `doc: None` is a tombstone left by a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// Commit version that wrote this entry
    pub version: u64,
    /// Document body, or None if deleted at this version
    pub doc: Option<Arc<Document>>,
}

impl StoredEntry {
    /// Live entry
    pub fn live(version: u64, doc: Document) -> Self {
        Self {
            version,
            doc: Some(Arc::new(doc)),
        }
    }

    /// Tombstone entry
    pub fn tombstone(version: u64) -> Self {
        Self { version, doc: None }
    }

    /// Whether this entry is a delete marker
    pub fn is_tombstone(&self) -> bool {
        self.doc.is_none()
    }
}

/// Version chain for MVCC
///
/// Entries are stored newest first, so a snapshot read walks from the front
/// until it finds the first entry at or below its version.
#[derive(Debug, Clone)]
pub struct VersionChain {
    versions: VecDeque<StoredEntry>,
}

impl VersionChain {
    /// Create a chain holding a single entry
    pub fn new(entry: StoredEntry) -> Self {
        let mut versions = VecDeque::with_capacity(4);
        versions.push_front(entry);
        Self { versions }
    }

    /// Add a new entry (must be newer than every existing entry)
    #[inline]
    pub fn push(&mut self, entry: StoredEntry) {
        debug_assert!(
            self.versions
                .front()
                .map_or(true, |newest| newest.version < entry.version),
            "version chain entries must be pushed in increasing version order"
        );
        self.versions.push_front(entry);
    }

    /// Newest entry with `version <= max_version`
    #[inline]
    pub fn get_at_version(&self, max_version: u64) -> Option<&StoredEntry> {
        self.versions.iter().find(|e| e.version <= max_version)
    }

    /// Newest entry
    #[inline]
    pub fn latest(&self) -> Option<&StoredEntry> {
        self.versions.front()
    }

    /// Version of the newest entry (0 for an empty chain)
    #[inline]
    pub fn latest_version(&self) -> u64 {
        self.latest().map_or(0, |e| e.version)
    }

    /// Drop entries no snapshot at or above `min_version` can observe
    ///
    /// Keeps every entry newer than `min_version` plus the newest entry at
    /// or below it. Returns the number of entries removed.
    pub fn gc(&mut self, min_version: u64) -> usize {
        let Some(keep) = self.versions.iter().position(|e| e.version <= min_version) else {
            return 0;
        };
        let before = self.versions.len();
        self.versions.truncate(keep + 1);
        before - self.versions.len()
    }

    /// True when the chain holds only a tombstone invisible to every
    /// snapshot at or above `min_version`
    pub fn is_dead(&self, min_version: u64) -> bool {
        self.versions.len() == 1
            && self
                .latest()
                .map_or(true, |e| e.is_tombstone() && e.version <= min_version)
    }

    /// Number of entries in the chain
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}

/// Per-collection shard
#[derive(Debug, Default)]
struct Shard {
    docs: HashMap<String, VersionChain>,
    /// Version of the last commit that wrote into this collection
    last_write_version: u64,
}

/// In-memory MVCC document storage
///
/// # Thread safety
///
/// Reads go through DashMap read guards and may run concurrently with each
/// other and with `apply`. `apply`, `gc` and `set_version` are called by the
/// single commit path and must not run concurrently with one another.
#[derive(Debug, Default)]
pub struct ShardedStore {
    shards: DashMap<String, Shard>,
    /// Last published commit version
    version: AtomicU64,
    /// Registered snapshot versions with reference counts
    active_snapshots: Mutex<BTreeMap<u64, usize>>,
}

impl ShardedStore {
    /// Create an empty store at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published commit version
    #[inline]
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Raise the published version to `version` (used by WAL replay)
    pub fn set_version(&self, version: u64) {
        self.version.fetch_max(version, Ordering::AcqRel);
    }

    /// Take a registered snapshot at the current version
    ///
    /// The snapshot pins its version against garbage collection until it
    /// is dropped.
    pub fn snapshot(self: &Arc<Self>) -> ShardedSnapshot {
        let mut active = self.active_snapshots.lock();
        let version = self.current_version();
        *active.entry(version).or_insert(0) += 1;
        drop(active);
        ShardedSnapshot::new(version, Arc::clone(self))
    }

    pub(crate) fn release_snapshot(&self, version: u64) {
        let mut active = self.active_snapshots.lock();
        if let Some(count) = active.get_mut(&version) {
            *count -= 1;
            if *count == 0 {
                active.remove(&version);
            }
        }
    }

    /// Number of live snapshot registrations
    pub fn active_snapshot_count(&self) -> usize {
        self.active_snapshots.lock().values().sum()
    }

    /// Entry visible at `version` for `key`
    pub fn get_at_version(&self, key: &DocKey, version: u64) -> Option<StoredEntry> {
        self.shards.get(&key.collection).and_then(|shard| {
            shard
                .docs
                .get(&key.id)
                .and_then(|chain| chain.get_at_version(version).cloned())
        })
    }

    /// Newest committed entry for `key`, published or not
    pub fn latest(&self, key: &DocKey) -> Option<StoredEntry> {
        self.shards.get(&key.collection).and_then(|shard| {
            shard
                .docs
                .get(&key.id)
                .and_then(|chain| chain.latest().cloned())
        })
    }

    /// Version of the newest entry for `key` (0 if never written)
    pub fn latest_version(&self, key: &DocKey) -> u64 {
        self.shards
            .get(&key.collection)
            .and_then(|shard| shard.docs.get(&key.id).map(VersionChain::latest_version))
            .unwrap_or(0)
    }

    /// Version of the last commit that wrote into `collection` (0 if never)
    pub fn collection_version(&self, collection: &str) -> u64 {
        self.shards
            .get(collection)
            .map_or(0, |shard| shard.last_write_version)
    }

    /// Every document of `collection` visible at `version`, in id order
    pub fn scan_at_version(&self, collection: &str, version: u64) -> Vec<StoredDoc> {
        let Some(shard) = self.shards.get(collection) else {
            return Vec::new();
        };
        let mut docs: Vec<StoredDoc> = shard
            .docs
            .iter()
            .filter_map(|(id, chain)| {
                let entry = chain.get_at_version(version)?;
                let doc = entry.doc.as_ref()?;
                Some(StoredDoc {
                    key: DocKey::new(collection, id.as_str()),
                    version: entry.version,
                    data: Document::clone(doc),
                })
            })
            .collect();
        docs.sort_by(|a, b| a.key.id.cmp(&b.key.id));
        docs
    }

    /// Install the writes of one commit and publish its version
    ///
    /// `version` must be greater than every version applied so far.
    pub fn apply(&self, version: u64, writes: &[ResolvedWrite]) {
        for write in writes {
            let entry = match &write.doc {
                Some(doc) => StoredEntry::live(version, doc.clone()),
                None => StoredEntry::tombstone(version),
            };
            let mut shard = self.shards.entry(write.key.collection.clone()).or_default();
            shard.last_write_version = shard.last_write_version.max(version);
            match shard.docs.entry(write.key.id.clone()) {
                Entry::Occupied(mut chain) => chain.get_mut().push(entry),
                Entry::Vacant(slot) => {
                    // Deleting a document that was never written leaves nothing behind
                    if !entry.is_tombstone() {
                        slot.insert(VersionChain::new(entry));
                    }
                }
            }
        }
        self.version.fetch_max(version, Ordering::AcqRel);
    }

    /// Oldest version any registered snapshot can read
    ///
    /// Falls back to the current version when no snapshot is registered.
    pub fn gc_horizon(&self) -> u64 {
        let active = self.active_snapshots.lock();
        active
            .keys()
            .next()
            .copied()
            .unwrap_or_else(|| self.current_version())
    }

    /// Prune versions below the GC horizon
    ///
    /// Returns the number of entries removed, counting removed chains.
    pub fn gc(&self) -> usize {
        let horizon = self.gc_horizon();
        let mut pruned = 0;
        for mut shard in self.shards.iter_mut() {
            shard.docs.retain(|_, chain| {
                pruned += chain.gc(horizon);
                if chain.is_dead(horizon) {
                    pruned += 1;
                    false
                } else {
                    true
                }
            });
        }
        if pruned > 0 {
            tracing::debug!(horizon, pruned, "pruned old document versions");
        }
        pruned
    }

    /// Number of documents live at the current version
    pub fn live_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .docs
                    .values()
                    .filter(|c| c.latest().map_or(false, |e| !e.is_tombstone()))
                    .count()
            })
            .sum()
    }

    /// Names of collections that have ever been written, sorted
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shards.iter().map(|s| s.key().clone()).collect();
        names.sort();
        names
    }
}
