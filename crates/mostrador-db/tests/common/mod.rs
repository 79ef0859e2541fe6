//! Shared helpers for integration tests.

use chrono::Utc;
use uuid::Uuid;

use mostrador_core::Product;
use mostrador_db::{Database, DbConfig};

/// Fresh in-memory database with migrations applied.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Fresh file-backed database with the production pool size (5 connections),
/// so tests exercise real cross-connection write contention.
#[allow(dead_code)]
pub async fn test_db_on_disk() -> Database {
    let path = std::env::temp_dir().join(format!("mostrador-test-{}.db", Uuid::new_v4()));
    Database::new(DbConfig::new(path))
        .await
        .expect("file-backed database")
}

/// Inserts a sellable product and returns it.
#[allow(dead_code)]
pub async fn seed_product(db: &Database, code: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: format!("Test {}", code),
        description: None,
        category: Some("TEST".to_string()),
        price_cents,
        cost_cents: price_cents / 2,
        stock,
        min_stock: 0,
        active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("insert product");
    product
}

/// Current stock for a product, straight from the catalog.
#[allow(dead_code)]
pub async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products()
        .get_by_id(id)
        .await
        .expect("get product")
        .expect("product exists")
        .stock
}
