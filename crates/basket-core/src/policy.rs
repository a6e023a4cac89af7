//! # Pricing Policy
//!
//! Cart-level configuration injected into [`CartAggregator`] at construction:
//! which currency the cart is registered in, the tax rate, and the shipping
//! rule.
//!
//! ## Currency Fallback Chain
//! ```text
//! cart has items? ──yes──► LineItemStore::price_currency(first item)
//!      │
//!      no
//!      ▼
//! registered_currency() ──Some──► use it
//!      │
//!      None
//!      ▼
//! default_currency()  (DEFAULT_CURRENCY unless overridden)
//! ```
//!
//! ## Configuration Sources
//! [`CartConfig`] is the stock policy. It can be built in code or from
//! `BASKET_*` environment variables via [`CartConfig::from_env`].
//!
//! [`CartAggregator`]: crate::aggregator::CartAggregator

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{CurrencyCode, Money};
use crate::types::TaxRate;
use crate::validation::validate_tax_rate_bps;
use crate::{DEFAULT_CURRENCY, DEFAULT_TAX_RATE};

/// Pricing rules consulted by the aggregator.
///
/// Every method has a default, so an embedding application overrides only the
/// hooks it cares about (typically `shipping_cost`).
pub trait PricingPolicy: Send + Sync {
    /// Currency the cart is registered in, used while the cart is empty.
    fn registered_currency(&self) -> Option<CurrencyCode> {
        None
    }

    /// Last-resort currency.
    fn default_currency(&self) -> CurrencyCode {
        DEFAULT_CURRENCY
    }

    /// Tax rate applied to the subtotal.
    fn tax_rate(&self) -> TaxRate {
        DEFAULT_TAX_RATE
    }

    /// Shipping cost for a cart with the given subtotal.
    ///
    /// The returned amount must be in `subtotal`'s currency.
    fn shipping_cost(&self, subtotal: Money) -> Money {
        Money::zero(subtotal.currency())
    }
}

// =============================================================================
// CartConfig
// =============================================================================

/// Stock pricing policy backed by plain configuration values.
///
/// ## Default Values
/// - Registered currency: none
/// - Default currency: USD
/// - Tax: 8.25%
/// - Shipping: free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartConfig {
    /// Currency the cart class registers, if any.
    pub registered_currency: Option<CurrencyCode>,

    /// Fallback when neither items nor a registered currency decide.
    pub default_currency: CurrencyCode,

    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,

    /// Flat shipping charge in cents, applied to every cart.
    pub flat_shipping_cents: i64,
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            registered_currency: None,
            default_currency: DEFAULT_CURRENCY,
            tax_rate_bps: DEFAULT_TAX_RATE.bps(),
            flat_shipping_cents: 0,
        }
    }
}

impl CartConfig {
    /// Sets the registered currency.
    pub fn with_registered_currency(mut self, currency: CurrencyCode) -> Self {
        self.registered_currency = Some(currency);
        self
    }

    /// Sets the default currency.
    pub fn with_default_currency(mut self, currency: CurrencyCode) -> Self {
        self.default_currency = currency;
        self
    }

    /// Sets the tax rate.
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate_bps = rate.bps();
        self
    }

    /// Sets a flat shipping charge in cents.
    pub fn with_flat_shipping_cents(mut self, cents: i64) -> Self {
        self.flat_shipping_cents = cents;
        self
    }

    /// Loads configuration from environment variables over the defaults.
    ///
    /// ## Environment Variables
    /// - `BASKET_CURRENCY`: registered currency (e.g. `EUR`)
    /// - `BASKET_DEFAULT_CURRENCY`: fallback currency
    /// - `BASKET_TAX_RATE`: tax percentage (e.g. `8.25`)
    /// - `BASKET_SHIPPING_CENTS`: flat shipping charge
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CartConfig::default();

        if let Some(code) = lookup("BASKET_CURRENCY") {
            config.registered_currency = Some(parse_currency("BASKET_CURRENCY", &code)?);
        }

        if let Some(code) = lookup("BASKET_DEFAULT_CURRENCY") {
            config.default_currency = parse_currency("BASKET_DEFAULT_CURRENCY", &code)?;
        }

        if let Some(rate) = lookup("BASKET_TAX_RATE") {
            let pct: f64 = rate
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BASKET_TAX_RATE".to_string()))?;
            if !pct.is_finite() || pct < 0.0 {
                return Err(ConfigError::InvalidValue("BASKET_TAX_RATE".to_string()));
            }
            let bps = TaxRate::from_percentage(pct).bps();
            validate_tax_rate_bps(bps)
                .map_err(|_| ConfigError::InvalidValue("BASKET_TAX_RATE".to_string()))?;
            config.tax_rate_bps = bps;
        }

        if let Some(cents) = lookup("BASKET_SHIPPING_CENTS") {
            let cents: i64 = cents
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BASKET_SHIPPING_CENTS".to_string()))?;
            if cents < 0 {
                return Err(ConfigError::InvalidValue("BASKET_SHIPPING_CENTS".to_string()));
            }
            config.flat_shipping_cents = cents;
        }

        Ok(config)
    }
}

fn parse_currency(key: &str, value: &str) -> Result<CurrencyCode, ConfigError> {
    CurrencyCode::parse(value).map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

impl PricingPolicy for CartConfig {
    fn registered_currency(&self) -> Option<CurrencyCode> {
        self.registered_currency
    }

    fn default_currency(&self) -> CurrencyCode {
        self.default_currency
    }

    fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    fn shipping_cost(&self, subtotal: Money) -> Money {
        Money::from_cents(self.flat_shipping_cents, subtotal.currency())
    }
}

/// Configuration error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
