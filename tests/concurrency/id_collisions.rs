//! Id regeneration when the generator repeats itself

use crate::common::*;
use skudb::CatalogError;
use std::sync::Arc;

#[test]
fn colliding_ids_under_contention_still_yield_unique_items() {
    // Every thread's first candidate id is the same
    let ids: Vec<String> = std::iter::repeat("shared".to_string()).take(8).collect();
    let catalog = Arc::new(ephemeral_catalog().with_id_generator(ScriptedIds::new(ids)));

    let items = concurrent_adds(Arc::clone(&catalog), 8, 1);
    assert_contiguous_skus(&items, 1000);
    assert_eq!(items.iter().filter(|i| i.id == "shared").count(), 1);

    let ctx = OpContext::background();
    assert_eq!(catalog.list(&ctx).unwrap().len(), 8);
}

#[test]
fn persistent_collisions_give_up_without_consuming_skus() {
    let config = CatalogConfig::default().with_max_id_attempts(4);
    let catalog = ItemCatalog::open(Arc::new(Database::ephemeral()), config)
        .unwrap()
        .with_id_generator(ScriptedIds::new(vec!["same"; 10]));
    let ctx = OpContext::background();

    catalog.add(&ctx, NewItem::new("first")).unwrap();
    assert!(matches!(
        catalog.add(&ctx, NewItem::new("second")),
        Err(CatalogError::IdCollision { attempts: 4 })
    ));
    assert_eq!(catalog.next_sku(&ctx).unwrap(), 1001);
}
