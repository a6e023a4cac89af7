//! # basket-db: Database Layer for Basket
//!
//! SQLite persistence for carts, built on sqlx. Provides the
//! [`SqliteLineItemStore`] implementation of `basket_core::LineItemStore`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basket Data Flow                                 │
//! │                                                                         │
//! │  CartAggregator<SqliteLineItemStore>  (basket-core)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    basket-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CartRepo      │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ LineItemStore │    │   _schema    │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (or :memory: in tests)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration and embedded migrations
//! - [`error`] - Database error types
//! - [`repository`] - Cart repository and line item store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use basket_core::{CartAggregator, CurrencyCode, Money, ProductRef};
//! use basket_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("basket.db")).await?;
//! let cart = db.carts().create().await?;
//!
//! let mut aggregator = CartAggregator::new(db.line_items(&cart.id));
//! aggregator
//!     .add_one(&ProductRef::new("Book", "1"), Money::from_cents(1299, CurrencyCode::USD))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::line_item::SqliteLineItemStore;
