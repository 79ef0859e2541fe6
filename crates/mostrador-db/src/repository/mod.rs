//! # Repository Module
//!
//! Database repository implementations for Mostrador POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.products().search("coke", 20)                              │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── try_decrement_stock(conn, id, qty)                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL lives here and only here. Checkout composes the in-transaction    │
//! │  helpers; everything else goes through the pool-backed methods.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads, CRUD, and stock movement
//! - [`sale::SaleRepository`] - Committed sales and their lines
//! - [`shift::ShiftRepository`] - Shift lifecycle and reconciliation
//! - [`cash::CashRepository`] - Append-only cash journal

pub mod cash;
pub mod product;
pub mod sale;
pub mod shift;
