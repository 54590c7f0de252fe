//! Catalog state across database reopen

use crate::common::*;
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn catalog_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    let created = {
        let (store, catalog) = disk_catalog(dir.path());
        let items: Vec<Item> = ["spoon", "spork", "knife"]
            .iter()
            .map(|n| catalog.add(&ctx, NewItem::new(*n)).unwrap())
            .collect();
        catalog.delete(&ctx, &items[1].id).unwrap();
        store.shutdown().unwrap();
        items
    };

    let (_store, catalog) = disk_catalog(dir.path());
    assert_eq!(catalog.get(&ctx, &created[0].id).unwrap(), created[0]);
    assert!(catalog.get(&ctx, &created[1].id).unwrap_err().is_not_found());
    assert_eq!(catalog.list(&ctx).unwrap().len(), 2);
    assert_eq!(catalog.add(&ctx, NewItem::new("ladle")).unwrap().sku, 1003);
}

#[test]
fn torn_wal_tail_loses_only_the_torn_commit() {
    let dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    let spoon = {
        let (_store, catalog) = disk_catalog(dir.path());
        catalog.add(&ctx, NewItem::new("spoon")).unwrap()
    };

    // Simulate a crash in the middle of appending the next commit
    {
        let wal = dir.path().join(skudb_durability::WAL_FILE_NAME);
        let mut file = OpenOptions::new().append(true).open(wal).unwrap();
        file.write_all(&[64, 0, 0, 0, 1]).unwrap();
    }

    let (store, catalog) = disk_catalog(dir.path());
    assert!(store.recovery_stats().truncated_tail);
    assert_eq!(catalog.get(&ctx, &spoon.id).unwrap(), spoon);
    assert_eq!(catalog.add(&ctx, NewItem::new("spork")).unwrap().sku, 1001);
}

#[test]
fn config_file_is_created_on_first_open() {
    let dir = TempDir::new().unwrap();
    let _ = disk_catalog(dir.path());
    let config = StoreConfig::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(config, StoreConfig::default());
}
