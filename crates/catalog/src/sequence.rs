//! SKU sequence manager
//!
//! The counter is a single document `{ "next": <i64> }` in the util
//! collection. It is seeded once when a catalog opens and afterwards only
//! advanced by [`SequenceManager::get_and_advance`], always inside the same
//! transaction that consumes the returned value. An attempt that aborts
//! leaves the counter where it was, so SKUs are handed out without gaps or
//! repeats in commit order.

use crate::error::{CatalogError, CatalogResult};
use crate::record::SequenceCounter;
use skudb_core::{decode, encode, DocKey, DocumentOps, DocumentStore, OpContext, StoredDoc};
use tracing::info;

/// Seeding can race with another catalog opening on the same store
const INIT_ATTEMPTS: usize = 3;

/// Allocates SKUs from the counter document
#[derive(Debug, Clone)]
pub struct SequenceManager {
    key: DocKey,
    start: i64,
}

/// What `ensure_initialized` found
enum InitOutcome {
    Seeded(i64),
    Existing(i64),
}

impl SequenceManager {
    /// Manager for the counter at `util_collection/counter_id`, seeded at `start`
    pub fn new(util_collection: &str, counter_id: &str, start: i64) -> Self {
        Self {
            key: DocKey::new(util_collection, counter_id),
            start,
        }
    }

    /// Counter document key
    pub fn key(&self) -> &DocKey {
        &self.key
    }

    /// Seed value
    pub fn start(&self) -> i64 {
        self.start
    }

    fn decode_counter(&self, doc: &StoredDoc) -> CatalogResult<SequenceCounter> {
        decode(&doc.data).map_err(|_| CatalogError::MalformedCounter {
            key: self.key.clone(),
            found: serde_json::Value::Object(doc.data.clone()).to_string(),
        })
    }

    /// Create the counter at the seed value if it does not exist yet
    ///
    /// Runs in its own transaction. An existing counter is left untouched,
    /// but must decode. Returns the counter's current value.
    pub fn ensure_initialized<S: DocumentStore>(&self, store: &S, ctx: &OpContext) -> CatalogResult<i64> {
        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            let result: CatalogResult<InitOutcome> = store.run_transaction(ctx, |tx| match tx.get(&self.key)? {
                Some(doc) => Ok(InitOutcome::Existing(self.decode_counter(&doc)?.next)),
                None => {
                    let seed = SequenceCounter { next: self.start };
                    tx.create(&self.key, encode(&seed)?)?;
                    Ok(InitOutcome::Seeded(self.start))
                }
            });
            match result {
                // Another opener seeded it between our read and our commit
                Err(e) if attempt < INIT_ATTEMPTS && e.is_already_exists_for(&self.key) => continue,
                other => break other?,
            }
        };

        match outcome {
            InitOutcome::Seeded(next) => {
                info!(counter = %self.key, next, "no SKU counter, seeded it");
                Ok(next)
            }
            InitOutcome::Existing(next) => {
                info!(counter = %self.key, next, "SKU counter ready");
                Ok(next)
            }
        }
    }

    /// Current counter value, without advancing it
    pub fn peek<O: DocumentOps>(&self, ops: &mut O) -> CatalogResult<i64> {
        match ops.get(&self.key)? {
            Some(doc) => Ok(self.decode_counter(&doc)?.next),
            None => Err(CatalogError::CounterMissing {
                key: self.key.clone(),
            }),
        }
    }

    /// Take the next SKU inside transaction `tx`
    ///
    /// Reads the counter through `tx`, stages `next + 1` through `tx` and
    /// returns the value read. Nothing is visible to other callers until
    /// `tx` commits.
    pub fn get_and_advance<O: DocumentOps>(&self, tx: &mut O) -> CatalogResult<i64> {
        let next = self.peek(tx)?;
        let advanced = next.checked_add(1).ok_or_else(|| CatalogError::SequenceExhausted {
            key: self.key.clone(),
        })?;
        tx.update(&self.key, encode(&SequenceCounter { next: advanced })?)?;
        Ok(next)
    }
}
