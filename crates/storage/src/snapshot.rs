//! Point-in-time views over the sharded store
//!
//! A [`ShardedSnapshot`] is registered with its store when taken and
//! unregistered on drop. While it lives, garbage collection keeps every
//! entry it can read.

use skudb_core::{DocKey, Document, StoredDoc};
use std::fmt;
use std::sync::Arc;

use crate::sharded::ShardedStore;

/// Registered read view at a fixed version
pub struct ShardedSnapshot {
    version: u64,
    store: Arc<ShardedStore>,
}

impl ShardedSnapshot {
    pub(crate) fn new(version: u64, store: Arc<ShardedStore>) -> Self {
        Self { version, store }
    }

    /// Version this snapshot reads at
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Document visible at the snapshot version
    pub fn get(&self, key: &DocKey) -> Option<StoredDoc> {
        let entry = self.store.get_at_version(key, self.version)?;
        let doc = entry.doc?;
        Some(StoredDoc {
            key: key.clone(),
            version: entry.version,
            data: Document::clone(&doc),
        })
    }

    /// Version of the entry visible for `key` (0 if none)
    ///
    /// Tombstones count: a document deleted before the snapshot reports the
    /// delete's version.
    pub fn observed_version(&self, key: &DocKey) -> u64 {
        self.store
            .get_at_version(key, self.version)
            .map_or(0, |e| e.version)
    }

    /// Whether a live document exists at the snapshot version
    pub fn contains(&self, key: &DocKey) -> bool {
        self.store
            .get_at_version(key, self.version)
            .map_or(false, |e| !e.is_tombstone())
    }

    /// All documents of `collection` visible at the snapshot version
    pub fn scan(&self, collection: &str) -> Vec<StoredDoc> {
        self.store.scan_at_version(collection, self.version)
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<ShardedStore> {
        &self.store
    }
}

impl fmt::Debug for ShardedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedSnapshot")
            .field("version", &self.version)
            .finish()
    }
}

impl Drop for ShardedSnapshot {
    fn drop(&mut self) {
        self.store.release_snapshot(self.version);
    }
}
