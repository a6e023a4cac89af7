//! # Cart Aggregator
//!
//! Mutation and aggregation logic for one shopping cart.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Aggregator Operations                           │
//! │                                                                         │
//! │  Caller Action            Aggregator              Store Calls           │
//! │  ─────────────            ──────────              ───────────           │
//! │                                                                         │
//! │  Add product ───────────► add(p, price, q, cum) ► find → create | save  │
//! │                                                                         │
//! │  Remove units ──────────► remove(p, q) ─────────► find → delete | save  │
//! │                                                                         │
//! │  Empty the cart ────────► clear() ──────────────► clear                 │
//! │                                                                         │
//! │  Show totals ───────────► subtotal/taxes/total ─► count, first, all     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Policy
//! Adding a product that is already in the cart never touches its stored
//! unit price. With `cumulative = true` the quantities are summed, otherwise
//! the requested quantity replaces the stored one.
//!
//! ## Single Writer
//! `add`, `remove` and `clear` read then write the store. They take
//! `&mut self`, so one aggregator has one writer at a time. Callers sharing a
//! cart across tasks wrap the aggregator in a lock (e.g.
//! `tokio::sync::Mutex<CartAggregator<_>>`), which serializes access per cart.

use tracing::debug;

use crate::error::{CartError, CartResult, CoreError, CoreResult, ValidationError};
use crate::money::{CurrencyCode, Money};
use crate::policy::{CartConfig, PricingPolicy};
use crate::store::LineItemStore;
use crate::types::{CartTotals, LineItem, ProductRef, TaxRate};
use crate::validation::{validate_product_ref, validate_quantity, validate_unit_price};

/// Aggregates the line items of one cart and derives its monetary totals.
///
/// ## Usage
/// ```rust
/// use basket_core::{CartAggregator, CurrencyCode, MemoryLineItemStore, Money, ProductRef};
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let mut cart = CartAggregator::new(MemoryLineItemStore::new());
/// let widget = ProductRef::new("Widget", "1");
///
/// cart.add(&widget, Money::from_cents(1000, CurrencyCode::USD), 2, true).await.unwrap();
/// assert_eq!(cart.subtotal().await.unwrap().cents(), 2000);
/// # });
/// ```
#[derive(Debug)]
pub struct CartAggregator<S, P = CartConfig> {
    store: S,
    policy: P,
}

impl<S: LineItemStore> CartAggregator<S, CartConfig> {
    /// Creates an aggregator with the default pricing policy.
    pub fn new(store: S) -> Self {
        CartAggregator {
            store,
            policy: CartConfig::default(),
        }
    }
}

impl<S, P> CartAggregator<S, P>
where
    S: LineItemStore,
    P: PricingPolicy,
{
    /// Creates an aggregator with an explicit pricing policy.
    pub fn with_policy(store: S, policy: P) -> Self {
        CartAggregator { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Consumes the aggregator, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` units of `product` to the cart.
    ///
    /// ## Behavior
    /// - Product not in cart: creates a line item at `unit_price`
    /// - Product in cart: `unit_price` is ignored; quantity becomes
    ///   `existing + quantity` when `cumulative`, else `quantity`
    ///
    /// ## Errors
    /// - `ValidationError` for a blank product ref, `quantity <= 0`, or a
    ///   negative price (nothing is written)
    /// - `CoreError::CurrencyMismatch` when creating a line item priced in a
    ///   currency other than the store's registered price currency (nothing
    ///   is written)
    /// - `CartError::Store` if the store fails
    pub async fn add(
        &mut self,
        product: &ProductRef,
        unit_price: Money,
        quantity: i64,
        cumulative: bool,
    ) -> CartResult<(), S::Error> {
        validate_product_ref(product)?;
        validate_quantity(quantity)?;
        validate_unit_price(&unit_price)?;

        let existing = self
            .store
            .find_by_product(product)
            .await
            .map_err(CartError::Store)?;

        match existing {
            None => {
                if let Some(registered) = self.store.registered_price_currency() {
                    if unit_price.currency() != registered {
                        return Err(CoreError::CurrencyMismatch {
                            expected: registered,
                            found: unit_price.currency(),
                        }
                        .into());
                    }
                }

                debug!(product = %product, price = %unit_price, quantity, "Creating line item");
                self.store
                    .create(product, unit_price, quantity)
                    .await
                    .map_err(CartError::Store)?;
            }
            Some(mut item) => {
                let new_quantity = if cumulative {
                    item.quantity()
                        .checked_add(quantity)
                        .ok_or_else(|| ValidationError::OutOfRange {
                            field: "quantity".to_string(),
                            min: 1,
                            max: i64::MAX,
                        })?
                } else {
                    quantity
                };

                debug!(
                    product = %product,
                    from = item.quantity(),
                    to = new_quantity,
                    cumulative,
                    "Updating line item quantity"
                );

                item.set_quantity(new_quantity)?;
                self.store.save(&item).await.map_err(CartError::Store)?;
            }
        }

        Ok(())
    }

    /// Adds a single unit, merging with any existing line.
    pub async fn add_one(
        &mut self,
        product: &ProductRef,
        unit_price: Money,
    ) -> CartResult<(), S::Error> {
        self.add(product, unit_price, 1, true).await
    }

    /// Removes `quantity` units of `product`.
    ///
    /// ## Behavior
    /// - Product not in cart: no-op
    /// - `existing <= quantity`: the line item is deleted
    /// - Otherwise: quantity is decremented
    pub async fn remove(&mut self, product: &ProductRef, quantity: i64) -> CartResult<(), S::Error> {
        validate_product_ref(product)?;
        validate_quantity(quantity)?;

        let Some(mut item) = self
            .store
            .find_by_product(product)
            .await
            .map_err(CartError::Store)?
        else {
            debug!(product = %product, "Remove of product not in cart ignored");
            return Ok(());
        };

        if item.quantity() <= quantity {
            debug!(product = %product, quantity = item.quantity(), "Deleting line item");
            self.store.delete(&item).await.map_err(CartError::Store)?;
        } else {
            let remaining = item.quantity() - quantity;
            debug!(product = %product, from = item.quantity(), to = remaining, "Decrementing line item");
            item.set_quantity(remaining)?;
            self.store.save(&item).await.map_err(CartError::Store)?;
        }

        Ok(())
    }

    /// Removes a single unit.
    pub async fn remove_one(&mut self, product: &ProductRef) -> CartResult<(), S::Error> {
        self.remove(product, 1).await
    }

    /// Removes every line item.
    pub async fn clear(&mut self) -> CartResult<(), S::Error> {
        debug!("Clearing cart");
        self.store.clear().await.map_err(CartError::Store)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True when the cart has no line items.
    pub async fn is_empty(&self) -> CartResult<bool, S::Error> {
        Ok(self.item_count().await? == 0)
    }

    /// Number of distinct products in the cart.
    pub async fn item_count(&self) -> CartResult<usize, S::Error> {
        self.store.count().await.map_err(CartError::Store)
    }

    /// Total units across all line items.
    ///
    /// This is a unit count: two widgets and three gadgets give 5, not 2.
    pub async fn total_quantity(&self) -> CartResult<i64, S::Error> {
        let items = self.line_items().await?;
        Ok(sum_quantities(&items)?)
    }

    /// Stored quantity of `product`, or 0 when it is not in the cart.
    pub async fn quantity_of(&self, product: &ProductRef) -> CartResult<i64, S::Error> {
        let item = self
            .store
            .find_by_product(product)
            .await
            .map_err(CartError::Store)?;
        Ok(item.map_or(0, |i| i.quantity()))
    }

    /// All line items in store iteration order.
    pub async fn line_items(&self) -> CartResult<Vec<LineItem>, S::Error> {
        self.store.all().await.map_err(CartError::Store)
    }

    /// Currency the cart's totals are expressed in.
    ///
    /// ## Resolution Order
    /// 1. Price currency of the first stored line item (store order)
    /// 2. The policy's registered currency
    /// 3. The policy's default currency
    pub async fn currency(&self) -> CartResult<CurrencyCode, S::Error> {
        if self.item_count().await? > 0 {
            if let Some(first) = self.store.first().await.map_err(CartError::Store)? {
                return Ok(self.store.price_currency(&first));
            }
        }

        Ok(self
            .policy
            .registered_currency()
            .unwrap_or_else(|| self.policy.default_currency()))
    }

    /// Σ `unit_price × quantity`, starting from zero in [`currency`](Self::currency).
    ///
    /// ## Errors
    /// `CoreError::CurrencyMismatch` if a line item is priced in a currency
    /// other than the cart's.
    pub async fn subtotal(&self) -> CartResult<Money, S::Error> {
        let currency = self.currency().await?;
        let items = self.line_items().await?;
        Ok(sum_line_totals(currency, &items)?)
    }

    /// Tax rate from the pricing policy.
    pub fn tax_rate(&self) -> TaxRate {
        self.policy.tax_rate()
    }

    /// `subtotal × tax_rate`, rounded to the cent.
    pub async fn taxes(&self) -> CartResult<Money, S::Error> {
        let subtotal = self.subtotal().await?;
        Ok(subtotal.calculate_tax(self.tax_rate()))
    }

    /// Shipping cost from the pricing policy (zero by default).
    pub async fn shipping_cost(&self) -> CartResult<Money, S::Error> {
        let subtotal = self.subtotal().await?;
        Ok(self.shipping_for(subtotal)?)
    }

    /// `subtotal + taxes + shipping_cost`.
    pub async fn total(&self) -> CartResult<Money, S::Error> {
        let subtotal = self.subtotal().await?;
        let taxes = subtotal.calculate_tax(self.tax_rate());
        let shipping = self.shipping_for(subtotal)?;
        Ok(subtotal.checked_add(taxes)?.checked_add(shipping)?)
    }

    /// Every derived figure computed from a single read of the store.
    pub async fn totals(&self) -> CartResult<CartTotals, S::Error> {
        let currency = self.currency().await?;
        let items = self.line_items().await?;

        let subtotal = sum_line_totals(currency, &items)?;
        let tax_rate = self.tax_rate();
        let taxes = subtotal.calculate_tax(tax_rate);
        let shipping = self.shipping_for(subtotal)?;
        let total = subtotal.checked_add(taxes)?.checked_add(shipping)?;

        Ok(CartTotals {
            item_count: items.len(),
            total_quantity: sum_quantities(&items)?,
            currency,
            subtotal,
            tax_rate,
            taxes,
            shipping,
            total,
        })
    }

    fn shipping_for(&self, subtotal: Money) -> CoreResult<Money> {
        let shipping = self.policy.shipping_cost(subtotal);
        subtotal.ensure_same_currency(&shipping)?;
        Ok(shipping)
    }
}

fn sum_line_totals(currency: CurrencyCode, items: &[LineItem]) -> CoreResult<Money> {
    items
        .iter()
        .try_fold(Money::zero(currency), |sum, item| {
            sum.checked_add(item.line_total()?)
        })
}

fn sum_quantities(items: &[LineItem]) -> CoreResult<i64> {
    items.iter().try_fold(0i64, |sum, item| {
        sum.checked_add(item.quantity())
            .ok_or(CoreError::Overflow { operation: "total_quantity" })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
