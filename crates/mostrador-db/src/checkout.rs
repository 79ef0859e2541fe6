//! # Checkout Service
//!
//! The one write path that turns a cart into durable state.
//!
//! ## Finalize Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       finalize_sale()                                   │
//! │                                                                         │
//! │  1. VALIDATE (no I/O)                                                   │
//! │     └── cart non-empty, quantities positive, discount within subtotal   │
//! │                                                                         │
//! │  2. SHIFT GUARD                                                         │
//! │     └── caller's shift must be Open; re-verified inside the tx          │
//! │                                                                         │
//! │  3. BEGIN IMMEDIATE TRANSACTION (write lock held from the start)        │
//! │     ├── conditional decrement per line, in cart order                   │
//! │     │   └── any failure → collect ALL shortages → ROLLBACK              │
//! │     ├── insert sale header + lines (line_no = cart position)            │
//! │     └── append income cash entry (category "sale", full total)          │
//! │                                                                         │
//! │  4. COMMIT                                                              │
//! │     └── stock, sale, lines, and cash entry land together or not at all  │
//! │                                                                         │
//! │  Nothing in step 3 is observable by other readers until step 4.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::cash::CashRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_sale_number, SaleRepository};
use mostrador_core::{
    validate_discount, validation, Cart, CashEntry, CashEntryType, CoreError, PaymentMethod, Sale,
    SaleLine, Shift, CASH_CATEGORY_SALE,
};

/// One cart line that could not be satisfied by stock on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortage {
    pub product_id: String,
    pub name: String,
    pub requested: i64,
    pub available: i64,
}

/// Errors from sale finalization.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The cart or its parameters failed validation before any write.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// No open shift to attach the sale to.
    #[error("no open shift; open a shift before selling")]
    ShiftNotOpen,

    /// One or more lines exceeded stock on hand; nothing was written.
    #[error("insufficient stock for {} line(s)", shortages.len())]
    StockConflict { shortages: Vec<StockShortage> },

    /// Underlying database failure; the transaction rolled back.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Db(DbError::from(err))
    }
}

/// Everything a successful finalize produced, for receipts and the UI.
#[derive(Debug, Clone)]
pub struct CommittedSale {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub cash_entry: CashEntry,
}

/// Coordinates the atomic sale-finalization transaction.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Finalizes a cart into a committed sale.
    ///
    /// All-or-nothing: on any error the database is exactly as it was
    /// before the call. The cart itself is not consumed; the caller
    /// clears it after a successful return.
    ///
    /// ## Returns
    /// * `Err(CheckoutError::Invalid)` - empty cart or bad discount
    /// * `Err(CheckoutError::ShiftNotOpen)` - no open shift
    /// * `Err(CheckoutError::StockConflict)` - every short line, with
    ///   requested vs. available quantities
    pub async fn finalize_sale(
        &self,
        cart: &Cart,
        shift: Option<&Shift>,
        user_id: &str,
        user_name: &str,
        payment_method: PaymentMethod,
        discount_cents: i64,
    ) -> Result<CommittedSale, CheckoutError> {
        // ---- 1. Validate before touching the database ----
        if cart.is_empty() {
            return Err(CheckoutError::Invalid(CoreError::EmptyCart));
        }

        for line in cart.lines() {
            validation::validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let subtotal_cents = cart.subtotal_cents();
        validate_discount(discount_cents, subtotal_cents)?;

        // ---- 2. Shift guard ----
        let shift = match shift {
            Some(s) if s.is_open() => s,
            _ => return Err(CheckoutError::ShiftNotOpen),
        };

        let total_cents = subtotal_cents - discount_cents;
        let sale_number = generate_sale_number();

        // ---- 3. The transaction ----
        // IMMEDIATE takes the write lock up front. A deferred BEGIN would
        // pin a read snapshot at the shift-check SELECT, and the first
        // decrement on a contended database would then fail with
        // SQLITE_BUSY_SNAPSHOT instead of queueing on the busy timeout.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        // Re-verify against the database: the caller's snapshot may be
        // stale if the shift closed since it was read.
        let still_open: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM shifts WHERE id = ?1 AND status = 'open'")
                .bind(&shift.id)
                .fetch_optional(&mut *tx)
                .await?;

        if still_open.is_none() {
            tx.rollback().await?;
            return Err(CheckoutError::ShiftNotOpen);
        }

        // Decrement every line, collecting ALL shortages rather than
        // stopping at the first, so the operator sees the full picture.
        let mut shortages = Vec::new();
        for line in cart.lines() {
            let ok = ProductRepository::try_decrement_stock(
                &mut *tx,
                &line.product_id,
                line.quantity,
            )
            .await?;

            if !ok {
                let available =
                    ProductRepository::stock_on_hand(&mut *tx, &line.product_id).await?;
                shortages.push(StockShortage {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    requested: line.quantity,
                    available,
                });
            }
        }

        if !shortages.is_empty() {
            tx.rollback().await?;
            warn!(
                sale_number = %sale_number,
                short_lines = shortages.len(),
                "Sale aborted: insufficient stock"
            );
            return Err(CheckoutError::StockConflict { shortages });
        }

        let now = Utc::now();

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: sale_number.clone(),
            shift_id: shift.id.clone(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            subtotal_cents,
            discount_cents,
            total_cents,
            payment_method,
            created_at: now,
        };

        SaleRepository::insert_sale_in_tx(&mut *tx, &sale).await?;

        let mut lines = Vec::with_capacity(cart.line_count());
        for (idx, cart_line) in cart.lines().iter().enumerate() {
            let line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                line_no: idx as i64 + 1,
                product_id: cart_line.product_id.clone(),
                name_snapshot: cart_line.name.clone(),
                unit_price_cents: cart_line.unit_price_cents,
                quantity: cart_line.quantity,
                line_total_cents: cart_line.line_total_cents(),
            };
            SaleRepository::insert_line_in_tx(&mut *tx, &line).await?;
            lines.push(line);
        }

        let cash_entry = CashEntry {
            id: Uuid::new_v4().to_string(),
            shift_id: shift.id.clone(),
            entry_type: CashEntryType::Income,
            category: CASH_CATEGORY_SALE.to_string(),
            amount_cents: total_cents,
            payment_method,
            description: Some(format!("Sale {}", sale_number)),
            created_at: now,
        };
        CashRepository::append_in_tx(&mut *tx, &cash_entry).await?;

        // ---- 4. Commit ----
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total_cents,
            line_count = lines.len(),
            "Sale finalized"
        );

        Ok(CommittedSale {
            sale,
            lines,
            cash_entry,
        })
    }
}
