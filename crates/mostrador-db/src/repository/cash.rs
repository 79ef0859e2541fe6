//! # Cash Repository
//!
//! Append-only cash movement journal, scoped to a shift.
//!
//! Entries are never updated or deleted. Corrections happen by writing a
//! compensating entry, so the journal always replays to the drawer's
//! history.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mostrador_core::CashEntry;

/// Columns selected for every CashEntry read.
const CASH_COLUMNS: &str =
    "id, shift_id, entry_type, category, amount_cents, payment_method, description, created_at";

const INSERT_SQL: &str = "INSERT INTO cash_entries ( \
        id, shift_id, entry_type, category, amount_cents, \
        payment_method, description, created_at \
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Repository for cash journal operations.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    /// Creates a new CashRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    /// Appends a cash entry (manual deposit or withdrawal).
    pub async fn append(&self, entry: &CashEntry) -> DbResult<()> {
        debug!(
            shift_id = %entry.shift_id,
            category = %entry.category,
            amount_cents = entry.amount_cents,
            "Appending cash entry"
        );

        sqlx::query(INSERT_SQL)
            .bind(&entry.id)
            .bind(&entry.shift_id)
            .bind(&entry.entry_type)
            .bind(&entry.category)
            .bind(entry.amount_cents)
            .bind(&entry.payment_method)
            .bind(&entry.description)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Appends a cash entry on an in-flight transaction connection.
    ///
    /// Checkout uses this so the sale's income entry commits or rolls back
    /// together with the sale itself.
    pub async fn append_in_tx(conn: &mut SqliteConnection, entry: &CashEntry) -> DbResult<()> {
        sqlx::query(INSERT_SQL)
            .bind(&entry.id)
            .bind(&entry.shift_id)
            .bind(&entry.entry_type)
            .bind(&entry.category)
            .bind(entry.amount_cents)
            .bind(&entry.payment_method)
            .bind(&entry.description)
            .bind(entry.created_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Lists a shift's entries in append order.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<CashEntry>> {
        let sql = format!(
            "SELECT {CASH_COLUMNS} FROM cash_entries \
             WHERE shift_id = ?1 ORDER BY created_at, id"
        );

        let entries = sqlx::query_as::<_, CashEntry>(&sql)
            .bind(shift_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Signed sum of all movement in a shift: income positive, expense negative.
    pub async fn sum_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE WHEN entry_type = 'income' \
                 THEN amount_cents ELSE -amount_cents END), 0) \
             FROM cash_entries WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Signed sum of a shift's entries filtered by category (e.g., "sale").
    pub async fn sum_for_shift_by_category(
        &self,
        shift_id: &str,
        category: &str,
    ) -> DbResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE WHEN entry_type = 'income' \
                 THEN amount_cents ELSE -amount_cents END), 0) \
             FROM cash_entries WHERE shift_id = ?1 AND category = ?2",
        )
        .bind(shift_id)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Per-payment-method signed totals for a shift, as (method, sum) pairs.
    pub async fn sums_by_payment_method(&self, shift_id: &str) -> DbResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT payment_method, \
                 COALESCE(SUM(CASE WHEN entry_type = 'income' \
                     THEN amount_cents ELSE -amount_cents END), 0) \
             FROM cash_entries WHERE shift_id = ?1 \
             GROUP BY payment_method ORDER BY payment_method",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
