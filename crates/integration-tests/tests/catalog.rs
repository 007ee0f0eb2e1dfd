//! Catalog behavior: id assignment under contention and the two read views.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use buyit_api::models::ProductSpec;
use buyit_api::store::{MemoryStore, Store};
use buyit_core::Price;
use rust_decimal::Decimal;

fn spec(name: &str) -> ProductSpec {
    ProductSpec {
        name: name.to_owned(),
        image: format!("{name}.png"),
        category: "misc".to_owned(),
        new_price: Price::new(Decimal::new(1000, 2)).unwrap(),
        old_price: Price::new(Decimal::new(1500, 2)).unwrap(),
    }
}

#[tokio::test]
async fn test_concurrent_creates_get_unique_ids() {
    let store = Arc::new(Store::Memory(MemoryStore::new(300)));

    let mut handles = Vec::new();
    for i in 0..100 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create_product(spec(&format!("p{i}"))).await.unwrap().id
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn test_featured_subset_is_pure() {
    let store = Store::Memory(MemoryStore::new(300));
    for i in 0..10 {
        store.create_product(spec(&format!("p{i}"))).await.unwrap();
    }

    let first: Vec<_> = store
        .featured_subset(4)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    let second: Vec<_> = store
        .featured_subset(4)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    // Reading the view must not have disturbed the catalog
    assert_eq!(store.list_products().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_recent_arrivals_are_the_newest_in_storage_order() {
    let store = Store::Memory(MemoryStore::new(300));
    let mut created = Vec::new();
    for i in 0..12 {
        created.push(store.create_product(spec(&format!("p{i}"))).await.unwrap().id);
    }

    let recent: Vec<_> = store
        .recent_arrivals(8)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(recent, created[4..].to_vec());
}

#[tokio::test]
async fn test_remove_product_shrinks_views() {
    let store = Store::Memory(MemoryStore::new(300));
    let kept = store.create_product(spec("kept")).await.unwrap();
    let removed = store.create_product(spec("removed")).await.unwrap();

    assert!(store.remove_product(removed.id).await.unwrap());
    assert!(!store.remove_product(removed.id).await.unwrap());

    let all: Vec<_> = store
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(all, vec![kept.id]);
}
