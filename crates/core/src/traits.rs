//! Store traits
//!
//! [`DocumentStore`] is the handle to an external transactional document
//! store. [`DocumentOps`] is the read/write surface shared by the store's
//! transaction type and by [`Detached`], the non-transactional path. Code
//! that should work both inside and outside a transaction is written
//! against `DocumentOps`.
//!
//! ## Transaction body contract
//!
//! `run_transaction` may execute the body more than once: when commit
//! validation reports a conflict the store throws the attempt away and runs
//! the body again on a fresh snapshot. Bodies must therefore:
//! - perform all reads before any write
//! - keep every side effect inside the transaction (no I/O, no mutation of
//!   captured state that outlives the attempt)

use crate::context::OpContext;
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::types::{DocKey, Document, StoredDoc};

/// Reads and writes against a store, transactional or not
pub trait DocumentOps {
    /// Read a document (None if absent)
    fn get(&mut self, key: &DocKey) -> StoreResult<Option<StoredDoc>>;

    /// Create a document; `AlreadyExists` if the key is taken
    fn create(&mut self, key: &DocKey, doc: Document) -> StoreResult<()>;

    /// Create or overwrite a document
    fn set(&mut self, key: &DocKey, doc: Document) -> StoreResult<()>;

    /// Merge `fields` into an existing document; `NotFound` if absent
    fn update(&mut self, key: &DocKey, fields: Document) -> StoreResult<()>;

    /// Delete a document; deleting an absent key succeeds
    fn delete(&mut self, key: &DocKey) -> StoreResult<()>;

    /// Run a collection query
    fn query(&mut self, query: &Query) -> StoreResult<Vec<StoredDoc>>;
}

/// Handle to a transactional document store
pub trait DocumentStore: Send + Sync {
    /// Transaction type handed to transaction bodies
    type Txn: DocumentOps;

    /// Run `body` in a transaction and commit it
    ///
    /// Commit conflicts are retried by re-running `body` from scratch.
    /// Errors returned by `body` abort the attempt and are returned as-is.
    fn run_transaction<T, E, F>(&self, ctx: &OpContext, body: F) -> Result<T, E>
    where
        F: FnMut(&mut Self::Txn) -> Result<T, E>,
        E: From<StoreError>;

    /// Non-transactional read
    fn get(&self, ctx: &OpContext, key: &DocKey) -> StoreResult<Option<StoredDoc>>;

    /// Non-transactional create
    fn create(&self, ctx: &OpContext, key: &DocKey, doc: Document) -> StoreResult<()>;

    /// Non-transactional upsert
    fn set(&self, ctx: &OpContext, key: &DocKey, doc: Document) -> StoreResult<()>;

    /// Non-transactional merge update
    fn update(&self, ctx: &OpContext, key: &DocKey, fields: Document) -> StoreResult<()>;

    /// Non-transactional delete
    fn delete(&self, ctx: &OpContext, key: &DocKey) -> StoreResult<()>;

    /// Non-transactional query
    fn query(&self, ctx: &OpContext, query: &Query) -> StoreResult<Vec<StoredDoc>>;

    /// Borrow the non-transactional path as a [`DocumentOps`]
    fn detached<'a>(&'a self, ctx: &'a OpContext) -> Detached<'a, Self>
    where
        Self: Sized,
    {
        Detached { store: self, ctx }
    }
}

/// Non-transactional [`DocumentOps`] bound to a store and a context
pub struct Detached<'a, S> {
    store: &'a S,
    ctx: &'a OpContext,
}

impl<'a, S: DocumentStore> Detached<'a, S> {
    /// Bind `store` and `ctx`
    pub fn new(store: &'a S, ctx: &'a OpContext) -> Self {
        Self { store, ctx }
    }
}

impl<S: DocumentStore> DocumentOps for Detached<'_, S> {
    fn get(&mut self, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        self.store.get(self.ctx, key)
    }

    fn create(&mut self, key: &DocKey, doc: Document) -> StoreResult<()> {
        self.store.create(self.ctx, key, doc)
    }

    fn set(&mut self, key: &DocKey, doc: Document) -> StoreResult<()> {
        self.store.set(self.ctx, key, doc)
    }

    fn update(&mut self, key: &DocKey, fields: Document) -> StoreResult<()> {
        self.store.update(self.ctx, key, fields)
    }

    fn delete(&mut self, key: &DocKey) -> StoreResult<()> {
        self.store.delete(self.ctx, key)
    }

    fn query(&mut self, query: &Query) -> StoreResult<Vec<StoredDoc>> {
        self.store.query(self.ctx, query)
    }
}
