//! # Shift Repository
//!
//! Cash-shift lifecycle: open, close, and the single-open-shift invariant.
//!
//! ## Lifecycle
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │   open(opening_cash)          close(counted_cash)                │
//! │        │                            │                            │
//! │        ▼                            ▼                            │
//! │   ┌─────────┐                 ┌──────────┐                       │
//! │   │  OPEN   │ ──────────────▶ │  CLOSED  │   (terminal)          │
//! │   └─────────┘                 └──────────┘                       │
//! │                                                                  │
//! │   At most ONE shift is open at any time. Enforced twice:         │
//! │   a pre-check here, and the partial unique index                 │
//! │   idx_shifts_single_open as the authoritative backstop.          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::validation::validate_cash_amount_cents;
use mostrador_core::{Shift, ShiftStatus};

/// Columns selected for every Shift read.
const SHIFT_COLUMNS: &str =
    "id, opened_at, closed_at, opening_cash_cents, closing_cash_cents, status";

/// Errors from shift lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    /// A shift is already open; it must be closed before opening another.
    #[error("a shift is already open (id: {shift_id})")]
    AlreadyOpen { shift_id: String },

    /// The operation requires an open shift and none exists.
    #[error("no open shift")]
    NoOpenShift,

    /// The opening or counted cash amount is negative.
    #[error("cash amount must not be negative (got {amount_cents})")]
    NegativeCash { amount_cents: i64 },

    /// Underlying database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ShiftError {
    fn from(err: sqlx::Error) -> Self {
        ShiftError::Db(DbError::from(err))
    }
}

/// Result of closing a shift: the terminal record plus the cash reconciliation.
#[derive(Debug, Clone)]
pub struct ShiftClose {
    /// The closed shift record.
    pub shift: Shift,
    /// Opening cash plus the signed sum of every cash entry in the shift.
    pub expected_cash_cents: i64,
    /// What the operator physically counted in the drawer.
    pub counted_cash_cents: i64,
    /// `counted - expected`. Negative means the drawer is short.
    pub discrepancy_cents: i64,
}

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a new shift with the given starting float.
    ///
    /// ## Returns
    /// * `Err(ShiftError::AlreadyOpen)` - another shift is still open
    /// * `Err(ShiftError::NegativeCash)` - opening amount below zero
    pub async fn open(&self, opening_cash_cents: i64) -> Result<Shift, ShiftError> {
        validate_cash_amount_cents(opening_cash_cents).map_err(|_| ShiftError::NegativeCash {
            amount_cents: opening_cash_cents,
        })?;

        if let Some(open) = self.current_open().await? {
            return Err(ShiftError::AlreadyOpen { shift_id: open.id });
        }

        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            opened_at: Utc::now(),
            closed_at: None,
            opening_cash_cents,
            closing_cash_cents: None,
            status: ShiftStatus::Open,
        };

        let result = sqlx::query(
            "INSERT INTO shifts ( \
                id, opened_at, closed_at, opening_cash_cents, closing_cash_cents, status \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&shift.id)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .bind(shift.opening_cash_cents)
        .bind(shift.closing_cash_cents)
        .bind(&shift.status)
        .execute(&self.pool)
        .await;

        // The partial unique index is the backstop when two openers race
        // past the pre-check.
        match result {
            Ok(_) => {}
            Err(e) => {
                let db_err = DbError::from(e);
                if db_err.is_unique_violation() {
                    let open = self.current_open().await?;
                    return Err(ShiftError::AlreadyOpen {
                        shift_id: open.map(|s| s.id).unwrap_or_default(),
                    });
                }
                return Err(ShiftError::Db(db_err));
            }
        }

        info!(shift_id = %shift.id, opening_cash_cents, "Shift opened");
        Ok(shift)
    }

    /// Closes the currently open shift against a physical drawer count.
    ///
    /// Expected cash is `opening_cash + Σ signed(entry.amount)` over every
    /// cash entry recorded in the shift. A closed shift is terminal.
    pub async fn close(&self, counted_cash_cents: i64) -> Result<ShiftClose, ShiftError> {
        validate_cash_amount_cents(counted_cash_cents).map_err(|_| ShiftError::NegativeCash {
            amount_cents: counted_cash_cents,
        })?;

        // One IMMEDIATE transaction for the whole close: the write lock is
        // held before the reconciliation sum runs, so a sale cannot commit
        // an entry between the sum and the status flip and vanish from
        // expected_cash_cents.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE status = 'open'");
        let mut shift = sqlx::query_as::<_, Shift>(&sql)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ShiftError::NoOpenShift)?;

        let closed_at = Utc::now();

        let result = sqlx::query(
            "UPDATE shifts SET status = 'closed', closed_at = ?2, closing_cash_cents = ?3 \
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(&shift.id)
        .bind(closed_at)
        .bind(counted_cash_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ShiftError::NoOpenShift);
        }

        let movement: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE WHEN entry_type = 'income' \
                 THEN amount_cents ELSE -amount_cents END), 0) \
             FROM cash_entries WHERE shift_id = ?1",
        )
        .bind(&shift.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let expected_cash_cents = shift.opening_cash_cents + movement;
        let discrepancy_cents = counted_cash_cents - expected_cash_cents;

        shift.status = ShiftStatus::Closed;
        shift.closed_at = Some(closed_at);
        shift.closing_cash_cents = Some(counted_cash_cents);

        info!(
            shift_id = %shift.id,
            expected_cash_cents,
            counted_cash_cents,
            discrepancy_cents,
            "Shift closed"
        );

        Ok(ShiftClose {
            shift,
            expected_cash_cents,
            counted_cash_cents,
            discrepancy_cents,
        })
    }

    /// Returns the currently open shift, if any.
    pub async fn current_open(&self) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE status = 'open'");

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Gets a shift by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1");

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Lists shifts most-recent-first (for end-of-day review).
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY opened_at DESC LIMIT ?1");

        let shifts = sqlx::query_as::<_, Shift>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(shifts)
    }
}
