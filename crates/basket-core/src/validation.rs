//! # Validation Module
//!
//! Input validation for cart operations.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartAggregator::add(product, price, qty, cumulative)                  │
//! │       │                                                                 │
//! │       ├── validate_product_ref ── empty type/id?  → Required           │
//! │       ├── validate_quantity ───── qty <= 0?       → MustBePositive     │
//! │       ├── validate_unit_price ─── price < 0?      → OutOfRange         │
//! │       │                                                                 │
//! │       └── OK → store lookup / create / save                            │
//! │                                                                         │
//! │  A rejected call never reaches the LineItemStore.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use basket_core::validation::validate_quantity;
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ProductRef;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a quantity passed to add or remove.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use basket_core::money::{CurrencyCode, Money};
/// use basket_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(&Money::from_cents(0, CurrencyCode::USD)).is_ok());
/// assert!(validate_unit_price(&Money::from_cents(-1, CurrencyCode::USD)).is_err());
/// ```
pub fn validate_unit_price(price: &Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a product reference.
///
/// ## Rules
/// - `product_type` and `product_id` must both be non-blank
pub fn validate_product_ref(product: &ProductRef) -> ValidationResult<()> {
    if product.product_type.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_type".to_string(),
        });
    }

    if product.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}
