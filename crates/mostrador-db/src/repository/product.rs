//! # Product Repository
//!
//! Catalog reads, product CRUD, and the inventory ledger.
//!
//! ## Stock: The One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Conditional Decrement                                 │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (races with the other terminal)             │
//! │     SELECT stock FROM products WHERE id = ?                             │
//! │     -- meanwhile terminal B sells the same units --                     │
//! │     UPDATE products SET stock = 2 WHERE id = ?                          │
//! │                                                                         │
//! │  ✅ CORRECT: compare-and-decrement in one statement                    │
//! │     UPDATE products SET stock = stock - ?                               │
//! │     WHERE id = ? AND stock >= ?                                         │
//! │                                                                         │
//! │  rows_affected == 0 means the stock was insufficient at the moment     │
//! │  the statement ran. Stock can never go negative: the predicate          │
//! │  guards it, and the schema CHECK backs the predicate up.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::validation::{
    validate_code, validate_price_cents, validate_product_name, validate_search_query,
};
use mostrador_core::Product;

/// Columns selected for every Product read.
const PRODUCT_COLUMNS: &str = "id, code, name, description, category, price_cents, cost_cents, \
     stock, min_stock, active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Catalog read contract: active products with stock on hand
/// let sellable = repo.list_sellable(50).await?;
///
/// // Get by ID
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Catalog read contract
    // =========================================================================

    /// Lists products offered for sale: active, stock > 0, sorted by name.
    ///
    /// This is the read the cart-building surface works from. Two calls
    /// without an intervening sale return identical stock values.
    pub async fn list_sellable(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE active = 1 AND stock > 0 ORDER BY name LIMIT ?1"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Searches sellable products by name (case-insensitive substring).
    ///
    /// An empty query falls back to the sellable listing.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_sellable(limit).await;
        }

        let pattern = format!("%{}%", query);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE active = 1 AND stock > 0 AND name LIKE ?1 \
             ORDER BY name LIMIT ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists products at or below their reorder threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE active = 1 AND stock <= min_stock ORDER BY name"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its business code (e.g., "COKE-330").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    // =========================================================================
    // CRUD collaborator surface
    // =========================================================================

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - malformed code, name, or price
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_code(&product.code)?;
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;

        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            "INSERT INTO products ( \
                id, code, name, description, category, \
                price_cents, cost_cents, stock, min_stock, \
                active, created_at, updated_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's catalog fields.
    ///
    /// Stock is deliberately NOT written here - stock moves only through
    /// [`Self::restock`] and the checkout decrement.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_code(&product.code)?;
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET \
                code = ?2, name = ?3, description = ?4, category = ?5, \
                price_cents = ?6, cost_cents = ?7, min_stock = ?8, \
                active = ?9, updated_at = ?10 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.min_stock)
        .bind(product.active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting active = false.
    ///
    /// Historical sales still reference the row, so it is never dropped.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // =========================================================================
    // Inventory ledger
    // =========================================================================

    /// Adds received stock to a product (goods receipt, manual correction).
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Restocking product");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(quantity)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically decrements stock if enough is on hand.
    ///
    /// ## Contract
    /// * Returns `Ok(true)` and decrements when `stock >= quantity`
    /// * Returns `Ok(false)` and mutates nothing otherwise
    ///
    /// This is a single conditional UPDATE, indivisible with respect to
    /// other callers targeting the same product. Used exclusively inside
    /// the checkout transaction; takes the transaction connection so the
    /// decrement rolls back with everything else.
    pub async fn try_decrement_stock(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock >= ?2",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Reads the current stock of a product on the given connection.
    ///
    /// Used to report how much actually was available when a conditional
    /// decrement fails.
    pub async fn stock_on_hand(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
