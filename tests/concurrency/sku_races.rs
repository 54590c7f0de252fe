//! SKU allocation under contention

use crate::common::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn two_racing_adds_get_consecutive_skus() {
    for _ in 0..20 {
        let catalog = Arc::new(ephemeral_catalog());
        let items = concurrent_adds(Arc::clone(&catalog), 2, 1);
        assert_contiguous_skus(&items, 1000);
    }
}

#[test]
fn many_racing_adds_are_unique_and_gap_free() {
    let catalog = Arc::new(ephemeral_catalog());
    let items = concurrent_adds(Arc::clone(&catalog), 16, 10);

    assert_eq!(items.len(), 160);
    assert_contiguous_skus(&items, 1000);
    let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids.len(), items.len());

    let ctx = OpContext::background();
    assert_eq!(catalog.next_sku(&ctx).unwrap(), 1160);
    for item in &items {
        assert_eq!(&catalog.get_by_sku(&ctx, item.sku).unwrap(), item);
    }
}

#[test]
fn racing_adds_on_disk_replay_identically() {
    let dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    let items = {
        let (store, catalog) = disk_catalog(dir.path());
        let items = concurrent_adds(Arc::new(catalog), 4, 10);
        store.shutdown().unwrap();
        items
    };

    let (_store, catalog) = disk_catalog(dir.path());
    assert_eq!(catalog.list(&ctx).unwrap().len(), items.len());
    assert_eq!(catalog.next_sku(&ctx).unwrap(), 1000 + items.len() as i64);
    for item in &items {
        assert_eq!(&catalog.get(&ctx, &item.id).unwrap(), item);
    }
}

#[test]
fn readers_never_see_a_half_created_item() {
    let catalog = Arc::new(ephemeral_catalog());
    let reader = {
        let catalog = Arc::clone(&catalog);
        std::thread::spawn(move || {
            let ctx = OpContext::background();
            for _ in 0..200 {
                let next = catalog.next_sku(&ctx).unwrap();
                let listed = catalog.list(&ctx).unwrap();
                // The counter is read first, so at most `next - 1000` items
                // existed at that moment and more may have committed since
                assert!(listed.len() as i64 >= next - 1000);
                for item in listed {
                    assert!(item.sku >= 1000);
                }
            }
        })
    };

    let items = concurrent_adds(Arc::clone(&catalog), 4, 25);
    reader.join().unwrap();
    assert_contiguous_skus(&items, 1000);
}
