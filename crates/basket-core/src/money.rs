//! # Money Module
//!
//! Provides the currency-tagged `Money` type and `CurrencyCode`.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents)                              │
//! │    $10.00 is stored as 1000, tax is rounded once, explicitly            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Currency Homogeneity
//! Every `Money` carries its `CurrencyCode`. Addition and subtraction are only
//! defined between identical currencies, so they are exposed as
//! `checked_add` / `checked_sub` returning [`CoreError::CurrencyMismatch`].
//! Multiplying by a quantity keeps the currency. Every operation that can leave
//! the `i64` cent range returns [`CoreError::Overflow`] instead of wrapping.
//!
//! ## Usage
//! ```rust
//! use basket_core::money::{CurrencyCode, Money};
//!
//! let price = Money::from_cents(1099, CurrencyCode::USD); // $10.99
//! let line = price.checked_mul_quantity(3).unwrap();       // $32.97
//! let total = line.checked_add(Money::from_cents(500, CurrencyCode::USD)).unwrap();
//! assert_eq!(total.cents(), 3797);
//!
//! let euros = Money::from_cents(100, CurrencyCode::EUR);
//! assert!(price.checked_add(euros).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::TaxRate;

// =============================================================================
// Currency Code
// =============================================================================

/// A three-letter uppercase currency code (ISO 4217 style), e.g. `USD`.
///
/// Stored inline as three ASCII bytes so `Money` stays `Copy`.
/// Serializes as a plain string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct CurrencyCode(#[ts(type = "string")] [u8; 3]);

impl CurrencyCode {
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const GBP: CurrencyCode = CurrencyCode(*b"GBP");
    pub const CAD: CurrencyCode = CurrencyCode(*b"CAD");

    /// Parses a currency code.
    ///
    /// ## Rules
    /// - Exactly three characters after trimming
    /// - Uppercase ASCII letters only (`usd` is rejected, not normalized)
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::CurrencyCode;
    ///
    /// assert_eq!(CurrencyCode::parse("EUR").unwrap(), CurrencyCode::EUR);
    /// assert!(CurrencyCode::parse("euro").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }

        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be three uppercase letters".to_string(),
            });
        }

        Ok(CurrencyCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Constructed only from ASCII uppercase bytes
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit, tagged with its currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Currency inline**: Mismatched arithmetic is caught, never silently summed
/// - **Copy**: 8 bytes of amount + 3 bytes of code
///
/// ## Where Money is Used
/// ```text
/// LineItem.unit_price ──► × quantity ──► Σ subtotal ──► taxes ──► total
///                                            │                     ▲
///                                            └──► shipping_cost ───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money {
    cents: i64,
    currency: CurrencyCode,
}

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::{CurrencyCode, Money};
    ///
    /// let price = Money::from_cents(1099, CurrencyCode::USD); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// assert_eq!(price.currency(), CurrencyCode::USD);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64, currency: CurrencyCode) -> Self {
        Money { cents, currency }
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50, USD)` is -$5.50.
    pub fn from_major_minor(major: i64, minor: i64, currency: CurrencyCode) -> CoreResult<Self> {
        let cents = major.checked_mul(100).and_then(|scaled| {
            if major < 0 {
                scaled.checked_sub(minor)
            } else {
                scaled.checked_add(minor)
            }
        });
        let cents = cents.ok_or(CoreError::Overflow {
            operation: "from_major_minor",
        })?;
        Ok(Money::from_cents(cents, currency))
    }

    /// Returns a zero amount in the given currency.
    #[inline]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Money::from_cents(0, currency)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the currency of this amount.
    #[inline]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.cents % 100).abs()
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money::from_cents(self.cents.abs(), self.currency)
    }

    /// Fails with `CurrencyMismatch` unless `other` shares this currency.
    pub fn ensure_same_currency(&self, other: &Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        Ok(())
    }

    /// Adds two amounts of the same currency.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::{CurrencyCode, Money};
    ///
    /// let a = Money::from_cents(1000, CurrencyCode::USD);
    /// let b = Money::from_cents(250, CurrencyCode::USD);
    /// assert_eq!(a.checked_add(b).unwrap().cents(), 1250);
    /// ```
    pub fn checked_add(self, other: Money) -> CoreResult<Money> {
        self.ensure_same_currency(&other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(CoreError::Overflow { operation: "add" })?;
        Ok(Money::from_cents(cents, self.currency))
    }

    /// Subtracts an amount of the same currency.
    pub fn checked_sub(self, other: Money) -> CoreResult<Money> {
        self.ensure_same_currency(&other)?;
        let cents = self
            .cents
            .checked_sub(other.cents)
            .ok_or(CoreError::Overflow { operation: "sub" })?;
        Ok(Money::from_cents(cents, self.currency))
    }

    /// `self × qty`, failing instead of wrapping on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::{CurrencyCode, Money};
    ///
    /// let unit_price = Money::from_cents(299, CurrencyCode::USD);
    /// assert_eq!(unit_price.checked_mul_quantity(3).unwrap().cents(), 897);
    /// assert!(unit_price.checked_mul_quantity(i64::MAX).is_err());
    /// ```
    pub fn checked_mul_quantity(self, qty: i64) -> CoreResult<Money> {
        let cents = self
            .cents
            .checked_mul(qty)
            .ok_or(CoreError::Overflow { operation: "multiply" })?;
        Ok(Money::from_cents(cents, self.currency))
    }

    /// Calculates tax at the given rate, rounding half up to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, in i128 so large
    /// subtotals cannot overflow. Negative amounts round half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::{CurrencyCode, Money};
    /// use basket_core::types::TaxRate;
    ///
    /// let price = Money::from_cents(1000, CurrencyCode::USD); // $10.00
    /// let tax = price.calculate_tax(TaxRate::from_bps(825));   // 8.25%
    /// // $0.825 → $0.83
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let product = self.cents as i128 * rate.bps() as i128;
        let rounded = if product < 0 {
            (product - 5000) / 10000
        } else {
            (product + 5000) / 10000
        };
        Money::from_cents(rounded as i64, self.currency)
    }

}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `10.99 USD`. Localized formatting belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} {}",
            sign,
            self.major().abs(),
            self.minor_part(),
            self.currency
        )
    }
}

/// Default money is zero in the process-wide default currency.
impl Default for Money {
    fn default() -> Self {
        Money::zero(crate::DEFAULT_CURRENCY)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
