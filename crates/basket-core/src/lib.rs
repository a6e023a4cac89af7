//! # basket-core: Pure Cart Logic for Basket
//!
//! This crate holds the cart's mutation and aggregation rules: how adds merge,
//! how removals delete, which currency a cart is in, and how subtotal, tax,
//! shipping and total are derived. It performs no I/O of its own.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Basket Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Embedding commerce application                     │   │
//! │  │      session handling ──► checkout ──► payment                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │aggregator │  │  policy   │  │   store   │  │   │
//! │  │   │   Money   │  │   add     │  │ tax rate  │  │ trait +   │  │   │
//! │  │   │ Currency  │  │  remove   │  │ shipping  │  │ in-memory │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LineItemStore                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    basket-db (Database Layer)                   │   │
//! │  │              SQLite line items, carts, migrations               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - `CartAggregator`, the cart operations
//! - [`money`] - `Money` and `CurrencyCode` with integer arithmetic
//! - [`types`] - `LineItem`, `ProductRef`, `TaxRate`, `CartTotals`
//! - [`policy`] - `PricingPolicy` trait and the `CartConfig` policy
//! - [`store`] - `LineItemStore` trait and `MemoryLineItemStore`
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use basket_core::{CartAggregator, CurrencyCode, MemoryLineItemStore, Money, ProductRef};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let mut cart = CartAggregator::new(MemoryLineItemStore::new());
//! let widget = ProductRef::new("Widget", "1");
//!
//! cart.add(&widget, Money::from_cents(1000, CurrencyCode::USD), 2, true).await.unwrap();
//! // A later add keeps the first price and merges the quantity
//! cart.add(&widget, Money::from_cents(9900, CurrencyCode::USD), 3, true).await.unwrap();
//!
//! assert_eq!(cart.total_quantity().await.unwrap(), 5);
//! assert_eq!(cart.subtotal().await.unwrap().cents(), 5000);
//! // 8.25% tax: $4.125 → $4.13
//! assert_eq!(cart.total().await.unwrap().cents(), 5413);
//! # });
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod error;
pub mod money;
pub mod policy;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::CartAggregator;
pub use error::{
    CartError, CartResult, CoreError, CoreResult, MemoryStoreError, ValidationError,
};
pub use money::{CurrencyCode, Money};
pub use policy::{CartConfig, ConfigError, PricingPolicy};
pub use store::{LineItemStore, MemoryLineItemStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Process-wide fallback currency, used when a cart is empty and no
/// registered currency is configured.
pub const DEFAULT_CURRENCY: CurrencyCode = CurrencyCode::USD;

/// Tax rate applied when a pricing policy does not override it (8.25%).
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(825);
