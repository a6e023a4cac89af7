//! # Domain Types
//!
//! Core domain types used throughout Basket.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Cart       │   │    LineItem     │   │   ProductRef    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  id (UUID)      │──►│  product_type   │       │
//! │  │  created_at     │   │  product        │   │  product_id     │       │
//! │  └─────────────────┘   │  unit_price     │   └─────────────────┘       │
//! │                        │  quantity ≥ 1   │                              │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │    TaxRate      │   │   CartTotals    │                              │
//! │  │  bps (u32)      │   │  subtotal/tax/  │                              │
//! │  │  825 = 8.25%    │   │  shipping/total │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A line item is keyed by the product it references, not by its own `id`.
//! The cart never owns products; it only stores `ProductRef`s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::{CurrencyCode, Money};
use crate::validation::{validate_quantity, ValidationResult};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    /// 8.25%, the rate applied when a policy does not override it.
    fn default() -> Self {
        crate::DEFAULT_TAX_RATE
    }
}

// =============================================================================
// Product Reference
// =============================================================================

/// Identity of a purchasable thing, by reference only.
///
/// Two refs name the same product iff both `product_type` and `product_id`
/// match, so a `Book` and a `Course` sharing id `42` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRef {
    /// Kind of product, e.g. `"Book"`.
    pub product_type: String,

    /// Identifier of the product within its kind.
    pub product_id: String,
}

impl ProductRef {
    pub fn new(product_type: impl Into<String>, product_id: impl Into<String>) -> Self {
        ProductRef {
            product_type: product_type.into(),
            product_id: product_id.into(),
        }
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.product_type, self.product_id)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One (product, price, quantity) record inside a cart.
///
/// ## Invariants
/// - `quantity >= 1` while the item exists; dropping to 0 deletes it
/// - `unit_price` is frozen at the first add and never rewritten by merges
///
/// Fields are private so both rules hold for every value in circulation.
/// Stores rebuild persisted items through [`LineItem::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Row identifier (UUID v4). Not the identity key.
    id: String,

    /// The referenced product (identity key).
    product: ProductRef,

    /// Price per unit at the time the product was first added.
    unit_price: Money,

    /// Number of units, at least 1.
    quantity: i64,

    #[ts(as = "String")]
    created_at: DateTime<Utc>,

    #[ts(as = "String")]
    updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Creates a fresh line item with a generated id.
    ///
    /// ## Errors
    /// `ValidationError::MustBePositive` if `quantity < 1`.
    pub fn new(product: ProductRef, unit_price: Money, quantity: i64) -> ValidationResult<Self> {
        validate_quantity(quantity)?;
        let now = Utc::now();
        Ok(LineItem {
            id: generate_line_item_id(),
            product,
            unit_price,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a persisted line item.
    ///
    /// ## Errors
    /// `ValidationError::MustBePositive` if `quantity < 1`.
    pub fn restore(
        id: impl Into<String>,
        product: ProductRef,
        unit_price: Money,
        quantity: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        validate_quantity(quantity)?;
        Ok(LineItem {
            id: id.into(),
            product,
            unit_price,
            quantity,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `unit_price × quantity`.
    ///
    /// ## Errors
    /// `CoreError::Overflow` if the product leaves the `i64` cent range.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price.checked_mul_quantity(self.quantity)
    }

    /// Sets the quantity and bumps `updated_at`.
    ///
    /// ## Errors
    /// `ValidationError::MustBePositive` if `quantity < 1`; the item is
    /// left unchanged.
    pub fn set_quantity(&mut self, quantity: i64) -> ValidationResult<()> {
        validate_quantity(quantity)?;
        self.quantity = quantity;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Helper to generate a new line item ID.
pub fn generate_line_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Cart
// =============================================================================

/// A persisted shopping session owning a set of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new cart record with a generated id.
    pub fn new() -> Self {
        let now = Utc::now();
        Cart {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Distinct products in the cart.
    pub item_count: usize,
    /// Units across all products.
    pub total_quantity: i64,
    pub currency: CurrencyCode,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub taxes: Money,
    pub shipping: Money,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_percentage(0.0), TaxRate::zero());
    }

    #[test]
    fn test_tax_rate_default_is_8_25() {
        assert_eq!(TaxRate::default().bps(), 825);
    }

    #[test]
    fn test_product_ref_identity_includes_type() {
        let book = ProductRef::new("Book", "42");
        let course = ProductRef::new("Course", "42");

        assert_ne!(book, course);
        assert_eq!(book, ProductRef::new("Book", "42"));
        assert_eq!(book.to_string(), "Book#42");
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::new(
            ProductRef::new("Widget", "1"),
            Money::from_cents(999, CurrencyCode::USD),
            2,
        )
        .unwrap();
        assert_eq!(
            item.line_total().unwrap(),
            Money::from_cents(1998, CurrencyCode::USD)
        );
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let item = LineItem::new(
            ProductRef::new("Widget", "1"),
            Money::from_cents(2, CurrencyCode::USD),
            i64::MAX,
        )
        .unwrap();

        assert!(matches!(
            item.line_total(),
            Err(crate::error::CoreError::Overflow { .. })
        ));
    }

    #[test]
    fn test_set_quantity_bumps_updated_at() {
        let mut item = LineItem::new(
            ProductRef::new("Widget", "1"),
            Money::from_cents(100, CurrencyCode::USD),
            1,
        )
        .unwrap();
        let before = item.updated_at();

        item.set_quantity(7).unwrap();

        assert_eq!(item.quantity(), 7);
        assert!(item.updated_at() >= before);
        assert_eq!(item.created_at(), before);
    }

    #[test]
    fn test_quantity_below_one_is_rejected() {
        let widget = ProductRef::new("Widget", "1");
        let price = Money::from_cents(100, CurrencyCode::USD);

        assert!(LineItem::new(widget.clone(), price, 0).is_err());
        assert!(LineItem::new(widget.clone(), price, -4).is_err());

        let now = Utc::now();
        assert!(LineItem::restore("li-1", widget.clone(), price, 0, now, now).is_err());

        let mut item = LineItem::restore("li-1", widget, price, 3, now, now).unwrap();
        assert_eq!(item.id(), "li-1");
        assert!(item.set_quantity(0).is_err());
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.updated_at(), now);
    }

    #[test]
    fn test_cart_totals_json_shape() {
        let zero = Money::zero(CurrencyCode::USD);
        let totals = CartTotals {
            item_count: 0,
            total_quantity: 0,
            currency: CurrencyCode::USD,
            subtotal: zero,
            tax_rate: TaxRate::default(),
            taxes: zero,
            shipping: zero,
            total: zero,
        };

        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["itemCount"], 0);
        assert_eq!(json["taxRate"], 825);
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["total"]["cents"], 0);
        assert_eq!(json["total"]["currency"], "USD");
    }
}
