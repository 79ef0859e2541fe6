//! # mostrador-db: Database Layer for Mostrador POS
//!
//! This crate provides database access for the Mostrador POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mostrador POS Data Flow                            │
//! │                                                                         │
//! │  Caller (UI shell, CLI, tests)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mostrador-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Checkout   │  │   │
//! │  │   │   (pool.rs)   │    │ product/sale  │    │ (checkout.rs)│  │   │
//! │  │   │               │    │ shift/cash    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ one struct    │◄───│ the atomic   │  │   │
//! │  │   │ + migrations  │    │ per table     │    │ finalize tx  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, sale, shift, cash)
//! - [`checkout`] - The sale-finalization transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mostrador_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/db.sqlite");
//! let db = Database::new(config).await?;
//! db.run_migrations().await?;
//!
//! let products = db.products().search("coke", 20).await?;
//! let shift = db.shifts().open(10_000).await?;
//! let committed = db
//!     .checkout()
//!     .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutError, CheckoutService, CommittedSale, StockShortage};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::cash::CashRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::shift::{ShiftClose, ShiftError, ShiftRepository};
