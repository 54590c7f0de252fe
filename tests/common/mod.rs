//! Shared test utilities for the workspace integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

pub use skudb::{
    CatalogConfig, Database, Item, ItemCatalog, ItemDb, NewItem, OpContext, RetryConfig,
    ScriptedIds, StoreConfig,
};
pub use skudb_engine::CONFIG_FILE_NAME;

/// Catalog over a fresh in-memory store.
pub fn ephemeral_catalog() -> ItemCatalog<Database> {
    ItemCatalog::open(Arc::new(Database::ephemeral()), CatalogConfig::default())
        .expect("open ephemeral catalog")
}

/// Catalog over an on-disk store in `dir`, plus the store handle.
pub fn disk_catalog(dir: &Path) -> (Arc<Database>, ItemCatalog<Database>) {
    let store = Arc::new(Database::open(dir).expect("open database"));
    let catalog =
        ItemCatalog::open(Arc::clone(&store), CatalogConfig::default()).expect("open catalog");
    (store, catalog)
}

/// Run `per_thread` adds on each of `threads` threads, all released at once.
///
/// Returns every created item.
pub fn concurrent_adds<D>(catalog: Arc<D>, threads: usize, per_thread: usize) -> Vec<Item>
where
    D: ItemDb + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = OpContext::background();
                barrier.wait();
                (0..per_thread)
                    .map(|i| {
                        catalog
                            .add(&ctx, NewItem::new(format!("item-{}-{}", t, i)))
                            .expect("concurrent add")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().expect("thread panicked"))
        .collect()
}

/// Assert that `items` hold exactly the SKUs `start..start + items.len()`.
pub fn assert_contiguous_skus(items: &[Item], start: i64) {
    let mut skus: Vec<i64> = items.iter().map(|i| i.sku).collect();
    skus.sort_unstable();
    let expected: Vec<i64> = (start..start + items.len() as i64).collect();
    assert_eq!(skus, expected, "SKUs must be unique and gap-free");
}
