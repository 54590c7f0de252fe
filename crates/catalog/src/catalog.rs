//! Catalog facade
//!
//! [`ItemDb`] is the operation surface front ends program against;
//! [`ItemCatalog`] implements it over any [`DocumentStore`].

use crate::collection::ItemCollection;
use crate::config::CatalogConfig;
use crate::create::CreateOrchestrator;
use crate::error::CatalogResult;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::record::{validate_name, Item, NewItem};
use crate::sequence::SequenceManager;
use skudb_core::{DocumentStore, OpContext};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Catalog operations
pub trait ItemDb: Send + Sync {
    /// Create an item with a fresh id and the next SKU
    fn add(&self, ctx: &OpContext, item: NewItem) -> CatalogResult<Item>;

    /// Item by id
    fn get(&self, ctx: &OpContext, id: &str) -> CatalogResult<Item>;

    /// Item by SKU
    fn get_by_sku(&self, ctx: &OpContext, sku: i64) -> CatalogResult<Item>;

    /// All items, ordered by id
    fn list(&self, ctx: &OpContext) -> CatalogResult<Vec<Item>>;

    /// SKU (decimal string) to item id
    fn list_skus(&self, ctx: &OpContext) -> CatalogResult<BTreeMap<String, String>>;

    /// Rename an existing item; its id and SKU never change
    fn update(&self, ctx: &OpContext, item: Item) -> CatalogResult<()>;

    /// Remove an item; removing an absent item succeeds
    fn delete(&self, ctx: &OpContext, id: &str) -> CatalogResult<()>;
}

/// Item catalog over a transactional document store
///
/// Holds no locks of its own: concurrent callers are coordinated entirely
/// by the store's transactions.
pub struct ItemCatalog<S: DocumentStore> {
    store: Arc<S>,
    config: CatalogConfig,
    items: ItemCollection,
    sequence: SequenceManager,
    ids: Box<dyn IdGenerator>,
}

impl<S: DocumentStore> ItemCatalog<S> {
    /// Open a catalog on `store`, seeding the SKU counter if needed
    ///
    /// Fails with `MalformedCounter` if an existing counter is unreadable.
    pub fn open(store: Arc<S>, config: CatalogConfig) -> CatalogResult<Self> {
        Self::open_with_context(store, config, &OpContext::background())
    }

    /// [`open`](Self::open) with a caller-supplied context
    pub fn open_with_context(store: Arc<S>, config: CatalogConfig, ctx: &OpContext) -> CatalogResult<Self> {
        config.validate()?;
        let sequence = SequenceManager::new(&config.util_collection, &config.counter_id, config.start_sku);
        sequence.ensure_initialized(store.as_ref(), ctx)?;
        Ok(Self {
            items: ItemCollection::new(config.data_collection.as_str()),
            sequence,
            store,
            config,
            ids: Box::new(UuidGenerator),
        })
    }

    /// Replace the id generator used by `add`
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Configuration in effect
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The SKU the next `add` would receive if nothing else commits first
    pub fn next_sku(&self, ctx: &OpContext) -> CatalogResult<i64> {
        self.sequence.peek(&mut self.store.detached(ctx))
    }

    fn orchestrator(&self) -> CreateOrchestrator<'_> {
        CreateOrchestrator {
            items: &self.items,
            sequence: &self.sequence,
            ids: self.ids.as_ref(),
            max_id_attempts: self.config.max_id_attempts,
        }
    }
}

impl<S: DocumentStore> ItemDb for ItemCatalog<S> {
    fn add(&self, ctx: &OpContext, item: NewItem) -> CatalogResult<Item> {
        item.validate()?;
        self.orchestrator().create(self.store.as_ref(), ctx, &item.name)
    }

    fn get(&self, ctx: &OpContext, id: &str) -> CatalogResult<Item> {
        self.items.fetch(&mut self.store.detached(ctx), id)
    }

    fn get_by_sku(&self, ctx: &OpContext, sku: i64) -> CatalogResult<Item> {
        self.items.find_by_sku(&mut self.store.detached(ctx), sku)
    }

    fn list(&self, ctx: &OpContext) -> CatalogResult<Vec<Item>> {
        self.items.list_all(&mut self.store.detached(ctx))
    }

    fn list_skus(&self, ctx: &OpContext) -> CatalogResult<BTreeMap<String, String>> {
        self.items.sku_index(&mut self.store.detached(ctx))
    }

    fn update(&self, ctx: &OpContext, item: Item) -> CatalogResult<()> {
        validate_name(&item.name)?;
        self.store.run_transaction(ctx, |tx| {
            let stored = self.items.fetch(tx, &item.id)?;
            let renamed = Item {
                name: item.name.clone(),
                ..stored
            };
            self.items.upsert(tx, &renamed)
        })
    }

    fn delete(&self, ctx: &OpContext, id: &str) -> CatalogResult<()> {
        self.items.delete(&mut self.store.detached(ctx), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::ids::ScriptedIds;
    use skudb_engine::Database;

    fn catalog() -> ItemCatalog<Database> {
        ItemCatalog::open(Arc::new(Database::ephemeral()), CatalogConfig::default()).unwrap()
    }

    #[test]
    fn test_open_seeds_counter() {
        let cat = catalog();
        let ctx = OpContext::background();
        assert_eq!(cat.next_sku(&ctx).unwrap(), 1000);
        assert!(cat.list(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let cat = catalog();
        let ctx = OpContext::background();
        assert!(matches!(
            cat.add(&ctx, NewItem::new("")),
            Err(CatalogError::InvalidItem(_))
        ));
        assert_eq!(cat.next_sku(&ctx).unwrap(), 1000);
    }

    #[test]
    fn test_update_keeps_id_and_sku() {
        let cat = catalog().with_id_generator(ScriptedIds::new(["spoon-id"]));
        let ctx = OpContext::background();
        let added = cat.add(&ctx, NewItem::new("spoon")).unwrap();

        cat.update(
            &ctx,
            Item {
                id: added.id.clone(),
                name: "ladle".into(),
                sku: 42,
            },
        )
        .unwrap();

        let stored = cat.get(&ctx, "spoon-id").unwrap();
        assert_eq!(stored.name, "ladle");
        assert_eq!(stored.sku, added.sku);
        assert_eq!(cat.get_by_sku(&ctx, added.sku).unwrap().id, "spoon-id");
    }

    #[test]
    fn test_update_missing_item() {
        let cat = catalog();
        let ctx = OpContext::background();
        let err = cat
            .update(
                &ctx,
                Item {
                    id: "ghost".into(),
                    name: "boo".into(),
                    sku: 1,
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(cat.list(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_custom_collections() {
        let store = Arc::new(Database::ephemeral());
        let config = CatalogConfig::default()
            .with_data_collection("offers")
            .with_util_collection("meta")
            .with_start_sku(1);
        let cat = ItemCatalog::open(Arc::clone(&store), config).unwrap();
        let ctx = OpContext::background();
        let item = cat.add(&ctx, NewItem::new("x")).unwrap();
        assert_eq!(item.sku, 1);

        let mut ops = store.detached(&ctx);
        assert!(ItemCollection::new("offers").fetch(&mut ops, &item.id).is_ok());
        assert!(ItemCollection::new("items").fetch(&mut ops, &item.id).is_err());
    }

    #[test]
    fn test_invalid_config_rejected_before_touching_store() {
        let store = Arc::new(Database::ephemeral());
        let config = CatalogConfig::default().with_util_collection("");
        assert!(matches!(
            ItemCatalog::open(Arc::clone(&store), config),
            Err(CatalogError::InvalidConfig(_))
        ));
        assert_eq!(store.current_version(), 0);
    }
}
