//! Record store adapter
//!
//! [`ItemCollection`] maps [`Item`] records onto documents of the data
//! collection. Every operation takes a [`DocumentOps`] target, so the same
//! code runs inside a transaction body (`&mut S::Txn`) or on the store's
//! non-transactional path (`Detached`). When a transaction is supplied,
//! every read and write goes through it.

use crate::error::{CatalogError, CatalogResult};
use crate::record::Item;
use skudb_core::{decode, encode, DocKey, DocumentOps, Direction, OrderBy, Query, StoredDoc};
use std::collections::BTreeMap;
use tracing::{error, warn};

/// Typed view of the data collection
#[derive(Debug, Clone)]
pub struct ItemCollection {
    collection: String,
}

impl ItemCollection {
    /// Adapter over `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.collection
    }

    /// Document key of item `id`
    pub fn key(&self, id: &str) -> DocKey {
        DocKey::new(self.collection.as_str(), id)
    }

    fn decode_doc(doc: &StoredDoc) -> CatalogResult<Item> {
        decode(&doc.data).map_err(|source| CatalogError::Decode {
            id: doc.key.id.clone(),
            source,
        })
    }

    /// Decode every document, skipping (and logging) the ones that fail
    fn decode_all(docs: Vec<StoredDoc>) -> Vec<Item> {
        docs.iter()
            .filter_map(|doc| match Self::decode_doc(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(id = %doc.key.id, error = %e, "skipping undecodable item");
                    None
                }
            })
            .collect()
    }

    /// Read item `id`
    pub fn fetch<O: DocumentOps>(&self, ops: &mut O, id: &str) -> CatalogResult<Item> {
        match ops.get(&self.key(id))? {
            Some(doc) => Self::decode_doc(&doc),
            None => Err(CatalogError::NotFound(id.to_string())),
        }
    }

    /// Create the item's document; `Store(AlreadyExists)` if the id is taken
    pub fn insert_if_absent<O: DocumentOps>(&self, ops: &mut O, item: &Item) -> CatalogResult<()> {
        ops.create(&self.key(&item.id), encode(item)?)?;
        Ok(())
    }

    /// Create or overwrite the item's document
    pub fn upsert<O: DocumentOps>(&self, ops: &mut O, item: &Item) -> CatalogResult<()> {
        ops.set(&self.key(&item.id), encode(item)?)?;
        Ok(())
    }

    /// The single item holding `sku`
    ///
    /// Looks for up to two matches so that a duplicated SKU is reported
    /// instead of silently picking one holder.
    pub fn find_by_sku<O: DocumentOps>(&self, ops: &mut O, sku: i64) -> CatalogResult<Item> {
        let query = Query::collection(self.collection.as_str())
            .where_eq("sku", sku)
            .limit(2);
        let mut hits = ops.query(&query)?;
        match hits.len() {
            0 => Err(CatalogError::NotFound(format!("sku {}", sku))),
            1 => Self::decode_doc(&hits.remove(0)),
            _ => {
                let ids: Vec<String> = hits.into_iter().map(|d| d.key.id).collect();
                error!(sku, ids = ?ids, "duplicate SKU detected");
                Err(CatalogError::DuplicateSku { sku, ids })
            }
        }
    }

    /// Every decodable item, ordered by id
    pub fn list_all<O: DocumentOps>(&self, ops: &mut O) -> CatalogResult<Vec<Item>> {
        let docs = ops.query(&Query::collection(self.collection.as_str()))?;
        Ok(Self::decode_all(docs))
    }

    /// SKU (as a decimal string) to item id, for every decodable item
    pub fn sku_index<O: DocumentOps>(&self, ops: &mut O) -> CatalogResult<BTreeMap<String, String>> {
        let query = Query::collection(self.collection.as_str())
            .order_by(OrderBy::Field("sku".to_string()), Direction::Asc);
        let docs = ops.query(&query)?;
        Ok(Self::decode_all(docs)
            .into_iter()
            .map(|item| (item.sku.to_string(), item.id))
            .collect())
    }

    /// Remove item `id`; removing an absent item succeeds
    pub fn delete<O: DocumentOps>(&self, ops: &mut O, id: &str) -> CatalogResult<()> {
        ops.delete(&self.key(id))?;
        Ok(())
    }
}
