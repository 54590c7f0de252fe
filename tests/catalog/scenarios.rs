//! Catalog walkthroughs through the umbrella crate

use crate::common::*;
use skudb::CatalogError;

#[test]
fn spoon_spork_walkthrough() {
    let catalog = ephemeral_catalog();
    let ctx = OpContext::background();

    let spoon = catalog.add(&ctx, NewItem::new("spoon")).unwrap();
    let spork = catalog.add(&ctx, NewItem::new("spork")).unwrap();
    assert_eq!((spoon.sku, spork.sku), (1000, 1001));

    let skus = catalog.list_skus(&ctx).unwrap();
    assert_eq!(
        skus.into_iter().collect::<Vec<_>>(),
        vec![
            ("1000".to_string(), spoon.id.clone()),
            ("1001".to_string(), spork.id.clone()),
        ]
    );

    catalog
        .update(
            &ctx,
            Item {
                name: "soup spoon".into(),
                ..spoon.clone()
            },
        )
        .unwrap();
    assert_eq!(catalog.get_by_sku(&ctx, 1000).unwrap().name, "soup spoon");

    catalog.delete(&ctx, &spork.id).unwrap();
    assert!(catalog.get_by_sku(&ctx, 1001).unwrap_err().is_not_found());
    assert_eq!(catalog.list(&ctx).unwrap().len(), 1);

    let knife = catalog.add(&ctx, NewItem::new("knife")).unwrap();
    assert_eq!(knife.sku, 1002);
}

#[test]
fn missing_records_are_not_found() {
    let catalog = ephemeral_catalog();
    let ctx = OpContext::background();
    assert!(matches!(
        catalog.get(&ctx, "nonexistent"),
        Err(CatalogError::NotFound(_))
    ));
    assert!(matches!(
        catalog.get_by_sku(&ctx, 999_999),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn cancelled_add_leaves_counter_untouched() {
    let catalog = ephemeral_catalog();
    let ctx = OpContext::background();
    ctx.cancel();
    assert!(matches!(
        catalog.add(&ctx, NewItem::new("spoon")),
        Err(CatalogError::Store(skudb::StoreError::Cancelled))
    ));

    let fresh = OpContext::background();
    assert_eq!(catalog.next_sku(&fresh).unwrap(), 1000);
    assert!(catalog.list(&fresh).unwrap().is_empty());
}

#[test]
fn catalog_is_usable_as_trait_object() {
    let catalog: std::sync::Arc<dyn ItemDb> = std::sync::Arc::new(ephemeral_catalog());
    let ctx = OpContext::background();
    let item = catalog.add(&ctx, NewItem::new("fork")).unwrap();
    assert_eq!(catalog.get(&ctx, &item.id).unwrap(), item);
}
