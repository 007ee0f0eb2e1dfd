//! Concurrency properties of the cart ledger under the in-memory backend.
//!
//! Every mutation is a field-level atomic step, so N concurrent increments
//! land as exactly +N and decrements can never push a slot negative.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use buyit_api::models::ProductSpec;
use buyit_api::store::{MemoryStore, Store};
use buyit_core::{AccountId, Email, Price, ProductId};
use rust_decimal::Decimal;

async fn store_with_account_and_product() -> (Arc<Store>, AccountId, ProductId) {
    let store = Store::Memory(MemoryStore::new(300));
    let email = Email::parse("race@test.example").unwrap();
    let account = store.create_account("racer", &email, "pw").await.unwrap();
    let product = store
        .create_product(ProductSpec {
            name: "widget".to_owned(),
            image: "widget.png".to_owned(),
            category: "misc".to_owned(),
            new_price: Price::new(Decimal::new(999, 2)).unwrap(),
            old_price: Price::new(Decimal::new(1299, 2)).unwrap(),
        })
        .await
        .unwrap();
    (Arc::new(store), account.id, product.id)
}

#[tokio::test]
async fn test_concurrent_increments_all_land() {
    let (store, account, product) = store_with_account_and_product().await;

    let mut handles = Vec::new();
    for _ in 0..100 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.cart_increment(account, product).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let cart = store.cart_read(account).await.unwrap();
    assert_eq!(cart.quantity(product), 100);
}

#[tokio::test]
async fn test_concurrent_mixed_mutations_balance() {
    let (store, account, product) = store_with_account_and_product().await;

    // Pre-load the slot far enough from zero that the decrement floor can
    // never engage; the outcome is then exactly the arithmetic sum
    for _ in 0..50 {
        store.cart_increment(account, product).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            if i % 5 < 3 {
                store.cart_increment(account, product).await.unwrap();
            } else {
                store.cart_decrement(account, product).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // 50 + 30 increments - 20 decrements
    let cart = store.cart_read(account).await.unwrap();
    assert_eq!(cart.quantity(product), 60);
}

#[tokio::test]
async fn test_increment_racing_removal_stays_consistent() {
    let (store, account, product) = store_with_account_and_product().await;

    // Incrementers race a catalog removal. Each add either lands while the
    // product is still registered or fails with NotFound; the final ledger
    // must hold exactly the adds that were admitted.
    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            match store.cart_increment(account, product).await {
                Ok(_) => true,
                Err(buyit_api::store::RepositoryError::NotFound) => false,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }));
    }
    let remover = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            store.remove_product(product).await.unwrap();
        })
    };

    let mut admitted = 0_u32;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    remover.await.unwrap();

    let cart = store.cart_read(account).await.unwrap();
    assert_eq!(cart.quantity(product), admitted);
}

#[tokio::test]
async fn test_concurrent_decrements_floor_at_zero() {
    let (store, account, product) = store_with_account_and_product().await;

    store.cart_increment(account, product).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let quantity = store.cart_decrement(account, product).await.unwrap();
            assert!(quantity <= 1);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let cart = store.cart_read(account).await.unwrap();
    assert_eq!(cart.quantity(product), 0);
}
