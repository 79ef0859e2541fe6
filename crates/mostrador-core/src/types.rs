//! # Domain Types
//!
//! Core domain types used throughout Mostrador POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    CashEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  sale_number    │   │  shift_id (FK)  │       │
//! │  │  price_cents    │   │  total_cents    │   │  amount_cents   │       │
//! │  │  stock          │   │  shift_id (FK)  │   │  entry_type     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Shift       │   │   ShiftStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  opening_cash   │   │  Open           │   │  Cash Transfer  │       │
//! │  │  closing_cash   │   │  Closed         │   │  Qr   Card      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (code, sale_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Stock is mutated by exactly two actors: catalog CRUD (restock, manual
/// corrections) and the checkout coordinator's conditional decrement. The
/// `stock` field on an in-memory value is a point-in-time read - only the
/// database row is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, unique per store (e.g., "COKE-330").
    pub code: String,

    /// Display name shown to the cashier and on tickets.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Optional category for catalog grouping.
    pub category: Option<String>,

    /// Unit sale price in cents (smallest currency unit). Non-negative.
    pub price_cents: i64,

    /// Unit cost in cents (for margin reporting).
    pub cost_cents: i64,

    /// Current stock level. Never negative.
    pub stock: i64,

    /// Reorder threshold: stock at or below this is flagged as low.
    pub min_stock: i64,

    /// Whether the product is offered for sale (soft delete).
    pub active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the catalog offers this product for new cart additions.
    /// Only active products with stock on hand are sellable.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.active && self.stock > 0
    }

    /// Whether stock has fallen to the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Every cash-ledger entry also carries one of these, so close-of-shift
/// reporting can break the drawer down by tender.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash in the drawer.
    Cash,
    /// Bank transfer.
    Transfer,
    /// QR wallet payment.
    Qr,
    /// Card payment on an external terminal.
    Card,
}

// =============================================================================
// Shift
// =============================================================================

/// The status of a cash-drawer shift.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Drawer is open; sales may be finalized against this shift.
    Open,
    /// Drawer has been counted and closed. Terminal state.
    Closed,
}

/// A bounded session of cash-drawer activity.
///
/// ## Invariant
/// At most one shift is open at any time. Every committed sale references
/// the shift that was open when it was finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shift {
    pub id: String,
    pub opened_at: DateTime<Utc>,
    /// None while the shift is open.
    pub closed_at: Option<DateTime<Utc>>,
    /// Drawer float counted in at open.
    pub opening_cash_cents: i64,
    /// Drawer counted at close. None until closed.
    pub closing_cash_cents: Option<i64>,
    pub status: ShiftStatus,
}

impl Shift {
    /// Whether sales can still be finalized against this shift.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale transaction.
///
/// Immutable once written: reporting, export and printing only ever read
/// these records. The line items live in [`SaleLine`] rows ordered by
/// `line_no`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Business identifier, unique and time-ordered (e.g., "V-20260830...").
    pub sale_number: String,
    /// The shift that was open when this sale was committed.
    pub shift_id: String,
    pub user_id: String,
    pub user_name: String,
    /// Sum of all line totals.
    pub subtotal_cents: i64,
    /// Caller-supplied discount, 0 <= discount <= subtotal.
    pub discount_cents: i64,
    /// subtotal - discount.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item of a committed sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// Position within the sale, starting at 1. Preserves cart order.
    pub line_no: i64,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold. Always >= 1.
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleLine {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Cash Entry
// =============================================================================

/// Direction of a cash-ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashEntryType {
    /// Money coming into the drawer (sales, deposits).
    Income,
    /// Money leaving the drawer (withdrawals, supplier payouts).
    Expense,
}

/// An append-only record of a cash-affecting event within a shift.
///
/// A committed sale produces exactly one income entry whose amount equals
/// the sale total; manual drawer movements produce deposit/withdrawal
/// entries. Entries are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashEntry {
    pub id: String,
    pub shift_id: String,
    pub entry_type: CashEntryType,
    /// Grouping key for reporting ("sale", "deposit", "withdrawal", ...).
    pub category: String,
    /// Absolute amount in cents. Always >= 0; direction is `entry_type`.
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CashEntry {
    /// Builds a manual deposit (drawer top-up) entry.
    pub fn deposit(shift_id: &str, amount_cents: i64, description: Option<String>) -> Self {
        CashEntry {
            id: uuid::Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            entry_type: CashEntryType::Income,
            category: "deposit".to_string(),
            amount_cents,
            payment_method: PaymentMethod::Cash,
            description,
            created_at: Utc::now(),
        }
    }

    /// Builds a manual withdrawal entry.
    pub fn withdrawal(shift_id: &str, amount_cents: i64, description: Option<String>) -> Self {
        CashEntry {
            id: uuid::Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            entry_type: CashEntryType::Expense,
            category: "withdrawal".to_string(),
            amount_cents,
            payment_method: PaymentMethod::Cash,
            description,
            created_at: Utc::now(),
        }
    }

    /// Amount with its sign applied: income positive, expense negative.
    #[inline]
    pub fn signed_amount_cents(&self) -> i64 {
        match self.entry_type {
            CashEntryType::Income => self.amount_cents,
            CashEntryType::Expense => -self.amount_cents,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min_stock: i64, active: bool) -> Product {
        Product {
            id: "p1".to_string(),
            code: "COKE-330".to_string(),
            name: "Coca-Cola 330ml".to_string(),
            description: None,
            category: Some("drinks".to_string()),
            price_cents: 250,
            cost_cents: 120,
            stock,
            min_stock,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sellable_requires_active_and_stock() {
        assert!(product(5, 0, true).is_sellable());
        assert!(!product(0, 0, true).is_sellable());
        assert!(!product(5, 0, false).is_sellable());
    }

    #[test]
    fn test_low_stock_threshold() {
        assert!(product(2, 3, true).is_low_stock());
        assert!(product(3, 3, true).is_low_stock());
        assert!(!product(4, 3, true).is_low_stock());
    }

    #[test]
    fn test_signed_cash_amounts() {
        let deposit = CashEntry::deposit("s1", 5000, None);
        assert_eq!(deposit.signed_amount_cents(), 5000);

        let withdrawal = CashEntry::withdrawal("s1", 2000, Some("supplier".to_string()));
        assert_eq!(withdrawal.signed_amount_cents(), -2000);
        assert_eq!(withdrawal.entry_type, CashEntryType::Expense);
    }

    #[test]
    fn test_shift_is_open() {
        let shift = Shift {
            id: "s1".to_string(),
            opened_at: Utc::now(),
            closed_at: None,
            opening_cash_cents: 10_000,
            closing_cash_cents: None,
            status: ShiftStatus::Open,
        };
        assert!(shift.is_open());
    }
}
