//! # Sale Repository
//!
//! Committed sale records and their lines. A sale row only ever exists
//! because a checkout transaction committed; there are no drafts and no
//! voids, so every row here is final.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use mostrador_core::{Sale, SaleLine};

/// Columns selected for every Sale read.
const SALE_COLUMNS: &str = "id, sale_number, shift_id, user_id, user_name, subtotal_cents, \
     discount_cents, total_cents, payment_method, created_at";

/// Columns selected for every SaleLine read.
const LINE_COLUMNS: &str =
    "id, sale_id, line_no, product_id, name_snapshot, unit_price_cents, quantity, line_total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // In-transaction writes (checkout only)
    // =========================================================================

    /// Inserts the sale header on an in-flight transaction connection.
    pub async fn insert_sale_in_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sales ( \
                id, sale_number, shift_id, user_id, user_name, \
                subtotal_cents, discount_cents, total_cents, \
                payment_method, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(&sale.shift_id)
        .bind(&sale.user_id)
        .bind(&sale.user_name)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(&sale.payment_method)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line on an in-flight transaction connection.
    pub async fn insert_line_in_tx(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_lines ( \
                id, sale_id, line_no, product_id, name_snapshot, \
                unit_price_cents, quantity, line_total_cents \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(line.line_no)
        .bind(&line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its human-facing sale number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE sale_number = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale's lines in cart order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no"
        );

        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Lists sales in a time window, newest first (daily/shift reports).
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at DESC"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Lists all sales recorded in a shift, oldest first.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE shift_id = ?1 ORDER BY created_at"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(shift_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sum of totals for a shift's sales (gross, after discounts).
    pub async fn total_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM sales WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Generates a human-facing sale number: `V-YYYYMMDD-HHMMSS-XXXX`.
///
/// The random suffix keeps two sales in the same second distinct; the
/// UNIQUE index on sale_number is the backstop.
pub fn generate_sale_number() -> String {
    let now = Utc::now();
    let suffix = &Uuid::new_v4().simple().to_string()[..4];
    format!(
        "V-{}-{}",
        now.format("%Y%m%d-%H%M%S"),
        suffix.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_number_shape() {
        let n = generate_sale_number();
        assert!(n.starts_with("V-"));
        // V- + 8 date + 1 dash + 6 time + 1 dash + 4 suffix
        assert_eq!(n.len(), 2 + 8 + 1 + 6 + 1 + 4);
    }

    #[test]
    fn sale_numbers_are_distinct() {
        let a = generate_sale_number();
        let b = generate_sale_number();
        assert_ne!(a, b);
    }
}
