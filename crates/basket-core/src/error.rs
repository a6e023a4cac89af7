//! # Error Types
//!
//! Domain-specific error types for basket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  basket-core errors (this file)                                        │
//! │  ├── ValidationError  - Rejected input (quantity, price, currency)     │
//! │  ├── CoreError        - Currency mismatch, amount overflow             │
//! │  ├── MemoryStoreError - MemoryLineItemStore failure                    │
//! │  └── CartError<E>     - What CartAggregator returns                    │
//! │         ├── Core(CoreError)                                            │
//! │         └── Store(E)  - LineItemStore failure, passed through as-is    │
//! │                                                                         │
//! │  basket-db errors (separate crate)                                     │
//! │  └── DbError          - Plugged in as E for the SQLite store           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::CurrencyCode;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Arithmetic attempted between two different currencies.
    ///
    /// ## When This Occurs
    /// - A cart holds line items priced in different currencies
    /// - A shipping policy returns a cost in a currency other than the cart's
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    /// A money amount left the `i64` cent range.
    #[error("Amount overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any store access, so a rejected call never mutates the cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., lowercase currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Memory Store Error
// =============================================================================

/// Errors returned by [`MemoryLineItemStore`](crate::store::MemoryLineItemStore).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// `save` was called for an item the store no longer holds.
    #[error("Line item not found: {0}")]
    NotFound(String),

    /// A price was offered in a currency other than the registered one.
    #[error("Price currency mismatch: store registers {registered}, found {found}")]
    CurrencyMismatch {
        registered: CurrencyCode,
        found: CurrencyCode,
    },

    /// The item itself is invalid (quantity below 1).
    #[error("Invalid line item: {0}")]
    Invalid(#[from] ValidationError),
}

// =============================================================================
// Cart Error
// =============================================================================

/// Errors returned by [`CartAggregator`](crate::aggregator::CartAggregator).
///
/// `E` is the store's own error type. Store failures are never retried or
/// rewrapped into a different kind.
#[derive(Debug, Error)]
pub enum CartError<E>
where
    E: std::error::Error + 'static,
{
    /// The line item store failed.
    #[error("Line item store error: {0}")]
    Store(#[source] E),

    /// A cart rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl<E> From<ValidationError> for CartError<E>
where
    E: std::error::Error + 'static,
{
    fn from(err: ValidationError) -> Self {
        CartError::Core(CoreError::Validation(err))
    }
}

impl<E> CartError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the validation failure, if this error is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            CartError::Core(CoreError::Validation(v)) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for aggregator operations over a store with error `E`.
pub type CartResult<T, E> = Result<T, CartError<E>>;

// =============================================================================
// Unit Tests
// =============================================================================
