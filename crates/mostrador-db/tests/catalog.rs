//! Integration tests for the catalog repository's input validation.

mod common;

use chrono::Utc;
use uuid::Uuid;

use common::{seed_product, test_db};
use mostrador_core::Product;
use mostrador_db::DbError;

fn product_with(code: &str, name: &str, price_cents: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: name.to_string(),
        description: None,
        category: None,
        price_cents,
        cost_cents: 0,
        stock: 10,
        min_stock: 0,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn insert_rejects_malformed_products() {
    let db = test_db().await;

    // Code with a space, empty name, negative price
    for bad in [
        product_with("BAD CODE", "Fine Name", 100),
        product_with("FINE-1", "", 100),
        product_with("FINE-2", "Fine Name", -1),
    ] {
        let err = db.products().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)), "got {err:?}");
    }

    // Nothing slipped through
    assert_eq!(db.products().count().await.unwrap(), 0);
}

#[tokio::test]
async fn update_rejects_malformed_fields() {
    let db = test_db().await;
    let mut product = seed_product(&db, "GOOD-1", 100, 10).await;

    product.name = String::new();
    let err = db.products().update(&product).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    // The stored row is untouched
    let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Test GOOD-1");
}

#[tokio::test]
async fn search_rejects_overlong_queries() {
    let db = test_db().await;
    seed_product(&db, "COKE-330", 150, 10).await;

    let err = db
        .products()
        .search(&"x".repeat(150), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    // A sane query still works
    let found = db.products().search("Test", 10).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn duplicate_code_maps_to_unique_violation() {
    let db = test_db().await;
    seed_product(&db, "DUP-1", 100, 10).await;

    let err = db
        .products()
        .insert(&product_with("DUP-1", "Other Name", 200))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}
