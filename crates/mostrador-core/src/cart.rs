//! # Cart
//!
//! Client-local staging area accumulating sale lines before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Operator Action          Cart Method             State Change          │
//! │  ───────────────          ───────────             ────────────          │
//! │                                                                         │
//! │  Tap product ────────────► add(&product) ───────► line qty +1 (or new) │
//! │                                                                         │
//! │  Change quantity ────────► set_quantity(id, n) ──► line qty = n         │
//! │                                                                         │
//! │  Quantity to zero ───────► set_quantity(id, 0) ──► line removed         │
//! │                                                                         │
//! │  Tap remove ─────────────► remove(id) ──────────► line removed          │
//! │                                                                         │
//! │  Checkout done ──────────► clear() ─────────────► all lines dropped     │
//! │                                                                         │
//! │  NOTE: the cart belongs to exactly one in-progress checkout session.    │
//! │        It is single-actor and performs no I/O; stock checks here are    │
//! │        ADVISORY (against the catalog snapshot taken at add time). The   │
//! │        authoritative check happens at commit in mostrador-db.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// ## Snapshot Pattern
/// `name`, `unit_price_cents` and `stock_snapshot` are frozen copies of the
/// product at the moment it was added. Catalog price changes after that
/// moment never retroactively alter an in-progress cart; the snapshot stock
/// backs the advisory quantity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID) - a reference, not ownership.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart. Always >= 1; a line at quantity 0 is removed.
    pub quantity: i64,

    /// Stock level from the catalog snapshot at add time. Advisory only.
    pub stock_snapshot: i64,

    /// When this line was added to the cart.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a cart line from a catalog product with quantity 1.
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity: 1,
            stock_snapshot: product.stock,
            added_at: Utc::now(),
        }
    }

    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increments)
/// - Quantity is always >= 1 (setting 0 removes the line)
/// - At most [`MAX_CART_ITEMS`] lines, [`MAX_LINE_QUANTITY`] per line
/// - Line order is insertion order; checkout processes lines in this order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of a product, or increments its line if present.
    ///
    /// ## Advisory Stock Check
    /// The increment is allowed only while the resulting quantity stays
    /// within the stock known from the catalog snapshot. Failure is locally
    /// recoverable: the cart is unchanged and the operator can retry after
    /// re-reading the catalog.
    pub fn add(&mut self, product: &Product) -> Result<(), CoreError> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + 1;
            if new_qty > line.stock_snapshot {
                return Err(CoreError::InsufficientStock {
                    name: line.name.clone(),
                    available: line.stock_snapshot,
                    requested: new_qty,
                });
            }
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        // Inactive products are not sellable no matter the residual stock.
        if !product.is_sellable() {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: if product.active { product.stock } else { 0 },
                requested: 1,
            });
        }

        self.lines.push(CartLine::from_product(product));
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - quantity <= 0 removes the line
    /// - quantity above the advisory stock snapshot fails as in [`Cart::add`]
    /// - line total is derived, so it follows the new quantity
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CoreError> {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        if quantity > line.stock_snapshot {
            return Err(CoreError::InsufficientStock {
                name: line.name.clone(),
                available: line.stock_snapshot,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove(&mut self, product_id: &str) -> Result<(), CoreError> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines. Called by the operator after a committed checkout.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// The lines in insertion order.
    #[inline]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the number of unique lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Calculates the subtotal. Pure, no side effects.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Checks if the cart is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
