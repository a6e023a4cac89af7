//! # Line Item Store
//!
//! The persistence seam between [`CartAggregator`] and wherever a cart's line
//! items actually live.
//!
//! ## Store Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartAggregator ──► LineItemStore (trait, this module)                 │
//! │                          │                                              │
//! │            ┌─────────────┴──────────────┐                               │
//! │            ▼                            ▼                               │
//! │  MemoryLineItemStore            SqliteLineItemStore                     │
//! │  (this module, tests,           (basket-db, one store                   │
//! │   request-scoped carts)          per cart id)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A store instance holds the items of exactly one cart. Iteration order
//! (`first`, `all`) is the order items were created in.
//!
//! ## Registered Price Currency
//! A store may register the currency its prices are kept in
//! ([`LineItemStore::registered_price_currency`]). `create` then refuses a
//! price in any other currency, so the currency resolved for a cart is always
//! one its items can be summed in.
//!
//! [`CartAggregator`]: crate::aggregator::CartAggregator

use async_trait::async_trait;

use crate::error::MemoryStoreError;
use crate::money::{CurrencyCode, Money};
use crate::types::{LineItem, ProductRef};

/// Persistent collection of one cart's line items.
///
/// Failures are reported through the associated `Error` type and surfaced to
/// aggregator callers as [`CartError::Store`](crate::error::CartError::Store).
///
/// ## Contract
/// - `create` fails when `unit_price` is not in the registered price currency
/// - `save` fails when the item is no longer stored
/// - `delete` of an absent item succeeds
#[async_trait]
pub trait LineItemStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finds the line item referencing `product`, if any.
    async fn find_by_product(&self, product: &ProductRef) -> Result<Option<LineItem>, Self::Error>;

    /// Creates and stores a new line item.
    async fn create(
        &mut self,
        product: &ProductRef,
        unit_price: Money,
        quantity: i64,
    ) -> Result<LineItem, Self::Error>;

    /// Persists a quantity change on an existing item.
    async fn save(&mut self, item: &LineItem) -> Result<(), Self::Error>;

    /// Deletes an item.
    async fn delete(&mut self, item: &LineItem) -> Result<(), Self::Error>;

    /// Deletes every item.
    async fn clear(&mut self) -> Result<(), Self::Error>;

    /// Number of stored items (distinct products).
    async fn count(&self) -> Result<usize, Self::Error>;

    /// The first item in iteration order.
    async fn first(&self) -> Result<Option<LineItem>, Self::Error>;

    /// All items in iteration order.
    async fn all(&self) -> Result<Vec<LineItem>, Self::Error>;

    /// Currency every stored price is kept in, if the store fixes one.
    fn registered_price_currency(&self) -> Option<CurrencyCode> {
        None
    }

    /// Currency declared for prices of `item`.
    ///
    /// The registered price currency when there is one, otherwise the
    /// currency the item was priced in.
    fn price_currency(&self, item: &LineItem) -> CurrencyCode {
        self.registered_price_currency()
            .unwrap_or_else(|| item.unit_price().currency())
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Insertion-ordered, in-process line item store.
///
/// Useful for request-scoped carts and as the reference implementation in
/// tests. Fails only where the [`LineItemStore`] contract requires it.
#[derive(Debug, Clone, Default)]
pub struct MemoryLineItemStore {
    items: Vec<LineItem>,
    price_currency: Option<CurrencyCode>,
}

impl MemoryLineItemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the currency every stored price must be in.
    pub fn with_price_currency(mut self, currency: CurrencyCode) -> Self {
        self.price_currency = Some(currency);
        self
    }

    /// Read access to the stored items.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }
}

#[async_trait]
impl LineItemStore for MemoryLineItemStore {
    type Error = MemoryStoreError;

    async fn find_by_product(
        &self,
        product: &ProductRef,
    ) -> Result<Option<LineItem>, MemoryStoreError> {
        Ok(self.items.iter().find(|i| i.product() == product).cloned())
    }

    async fn create(
        &mut self,
        product: &ProductRef,
        unit_price: Money,
        quantity: i64,
    ) -> Result<LineItem, MemoryStoreError> {
        if let Some(registered) = self.price_currency {
            if unit_price.currency() != registered {
                return Err(MemoryStoreError::CurrencyMismatch {
                    registered,
                    found: unit_price.currency(),
                });
            }
        }

        let item = LineItem::new(product.clone(), unit_price, quantity)?;
        self.items.push(item.clone());
        Ok(item)
    }

    async fn save(&mut self, item: &LineItem) -> Result<(), MemoryStoreError> {
        let stored = self
            .items
            .iter_mut()
            .find(|i| i.id() == item.id())
            .ok_or_else(|| MemoryStoreError::NotFound(item.id().to_string()))?;

        // Only the quantity and its timestamp change; the price stays frozen
        *stored = LineItem::restore(
            stored.id(),
            stored.product().clone(),
            stored.unit_price(),
            item.quantity(),
            stored.created_at(),
            item.updated_at(),
        )?;
        Ok(())
    }

    async fn delete(&mut self, item: &LineItem) -> Result<(), MemoryStoreError> {
        self.items.retain(|i| i.id() != item.id());
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), MemoryStoreError> {
        self.items.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, MemoryStoreError> {
        Ok(self.items.len())
    }

    async fn first(&self) -> Result<Option<LineItem>, MemoryStoreError> {
        Ok(self.items.first().cloned())
    }

    async fn all(&self) -> Result<Vec<LineItem>, MemoryStoreError> {
        Ok(self.items.clone())
    }

    fn registered_price_currency(&self) -> Option<CurrencyCode> {
        self.price_currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let mut store = MemoryLineItemStore::new();
        let widget = ProductRef::new("Widget", "1");

        let created = store.create(&widget, usd(1000), 2).await.unwrap();

        let found = store.find_by_product(&widget).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(store
            .find_by_product(&ProductRef::new("Widget", "2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_iteration_order_is_insertion_order() {
        let mut store = MemoryLineItemStore::new();
        store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();
        store.create(&ProductRef::new("B", "1"), usd(2), 1).await.unwrap();
        store.create(&ProductRef::new("C", "1"), usd(3), 1).await.unwrap();

        let first = store.first().await.unwrap().unwrap();
        assert_eq!(first.product().product_type, "A");

        let types: Vec<_> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.product().product_type.clone())
            .collect();
        assert_eq!(types, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_save_updates_quantity_only() {
        let mut store = MemoryLineItemStore::new();
        let widget = ProductRef::new("Widget", "1");
        let item = store.create(&widget, usd(1000), 2).await.unwrap();

        let repriced = LineItem::restore(
            item.id(),
            widget.clone(),
            usd(1),
            9,
            item.created_at(),
            Utc::now(),
        )
        .unwrap();
        store.save(&repriced).await.unwrap();

        let stored = store.find_by_product(&widget).await.unwrap().unwrap();
        assert_eq!(stored.quantity(), 9);
        assert_eq!(stored.unit_price(), usd(1000));
        assert_eq!(stored.updated_at(), repriced.updated_at());
    }

    #[tokio::test]
    async fn test_save_of_deleted_item_is_not_found() {
        let mut store = MemoryLineItemStore::new();
        let mut item = store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();
        store.delete(&item).await.unwrap();

        item.set_quantity(3).unwrap();
        let err = store.save(&item).await.unwrap_err();

        assert_eq!(err, MemoryStoreError::NotFound(item.id().to_string()));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_quantity() {
        let mut store = MemoryLineItemStore::new();
        let err = store
            .create(&ProductRef::new("A", "1"), usd(1), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, MemoryStoreError::Invalid(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let mut store = MemoryLineItemStore::new();
        let a = store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();
        store.create(&ProductRef::new("B", "1"), usd(1), 1).await.unwrap();

        store.delete(&a).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        // Deleting twice is not an error
        store.delete(&a).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.first().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registered_price_currency() {
        let mut store = MemoryLineItemStore::new().with_price_currency(CurrencyCode::EUR);
        assert_eq!(store.registered_price_currency(), Some(CurrencyCode::EUR));

        let err = store
            .create(&ProductRef::new("A", "1"), usd(100), 1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MemoryStoreError::CurrencyMismatch {
                registered: CurrencyCode::EUR,
                found: CurrencyCode::USD,
            }
        );
        assert_eq!(store.count().await.unwrap(), 0);

        let item = store
            .create(&ProductRef::new("A", "1"), Money::from_cents(100, CurrencyCode::EUR), 1)
            .await
            .unwrap();
        assert_eq!(store.price_currency(&item), CurrencyCode::EUR);
    }

    #[tokio::test]
    async fn test_price_currency_defaults_to_item_currency() {
        let mut store = MemoryLineItemStore::new();
        let item = store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();

        assert_eq!(store.registered_price_currency(), None);
        assert_eq!(store.price_currency(&item), CurrencyCode::USD);
    }
}
