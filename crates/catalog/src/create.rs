//! Transactional create
//!
//! Creating an item takes the next SKU and inserts the item document in one
//! store transaction, so the counter only advances for items that exist.
//! Two independent retry loops wrap that transaction:
//!
//! - the store's own conflict retry re-runs the body, with the same
//!   candidate id, when another commit advanced the counter first
//! - the collision loop here draws a new id when the candidate is already
//!   taken, and starts a fresh transaction
//!
//! Any other failure is returned unchanged.

use crate::collection::ItemCollection;
use crate::error::{CatalogError, CatalogResult};
use crate::ids::IdGenerator;
use crate::record::Item;
use crate::sequence::SequenceManager;
use skudb_core::{DocumentStore, OpContext};
use tracing::debug;

/// Everything a create needs, borrowed from the catalog
pub(crate) struct CreateOrchestrator<'a> {
    pub(crate) items: &'a ItemCollection,
    pub(crate) sequence: &'a SequenceManager,
    pub(crate) ids: &'a dyn IdGenerator,
    pub(crate) max_id_attempts: usize,
}

impl CreateOrchestrator<'_> {
    /// Create an item named `name` with a fresh id and the next SKU
    pub(crate) fn create<S: DocumentStore>(
        &self,
        store: &S,
        ctx: &OpContext,
        name: &str,
    ) -> CatalogResult<Item> {
        for attempt in 1..=self.max_id_attempts {
            let id = self.ids.generate();
            let key = self.items.key(&id);

            let result: CatalogResult<Item> = store.run_transaction(ctx, |tx| {
                let sku = self.sequence.get_and_advance(tx)?;
                let item = Item {
                    id: id.clone(),
                    name: name.to_string(),
                    sku,
                };
                self.items.insert_if_absent(tx, &item)?;
                Ok(item)
            });

            match result {
                Ok(item) => {
                    debug!(id = %item.id, sku = item.sku, "item created");
                    return Ok(item);
                }
                Err(e) if e.is_already_exists_for(&key) => {
                    debug!(id = %id, attempt, "item id collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CatalogError::IdCollision {
            attempts: self.max_id_attempts,
        })
    }
}
