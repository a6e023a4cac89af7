//! # SQLite Line Item Store
//!
//! [`LineItemStore`] backed by the `cart_items` table.
//!
//! ## Row Mapping
//! ```text
//! ┌──────────────────────────────┐          ┌──────────────────────────────┐
//! │ cart_items (one cart_id)     │          │ LineItem                     │
//! │  id                          │ ───────► │  id                          │
//! │  product_type, product_id    │ ───────► │  product: ProductRef         │
//! │  price_cents, currency       │ ───────► │  unit_price: Money           │
//! │  quantity                    │ ───────► │  quantity                    │
//! │  created_at, updated_at      │ ───────► │  created_at, updated_at      │
//! └──────────────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Iteration order is `rowid` order, i.e. the order items were created in.
//! A row whose quantity is below 1 fails to decode.
//! The `(cart_id, product_type, product_id)` unique index backs the
//! one-row-per-product rule at the storage level.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use basket_core::{CurrencyCode, LineItem, LineItemStore, Money, ProductRef};

const SELECT_COLUMNS: &str = "SELECT id, product_type, product_id, price_cents, currency, \
     quantity, created_at, updated_at FROM cart_items";

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    id: String,
    product_type: String,
    product_id: String,
    price_cents: i64,
    currency: String,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = DbError;

    fn try_from(row: LineItemRow) -> DbResult<Self> {
        let currency = CurrencyCode::parse(&row.currency)
            .map_err(|e| DbError::Decode(format!("cart_items.currency of {}: {}", row.id, e)))?;

        LineItem::restore(
            row.id.as_str(),
            ProductRef::new(row.product_type, row.product_id),
            Money::from_cents(row.price_cents, currency),
            row.quantity,
            row.created_at,
            row.updated_at,
        )
        .map_err(|e| DbError::Decode(format!("cart_items.quantity of {}: {}", row.id, e)))
    }
}

/// Line items of one cart, stored in SQLite.
///
/// ## Usage
/// ```rust,ignore
/// let store = db.line_items(&cart.id);
/// let mut aggregator = CartAggregator::new(store);
/// ```
#[derive(Debug, Clone)]
pub struct SqliteLineItemStore {
    pool: SqlitePool,
    cart_id: String,
    price_currency: Option<CurrencyCode>,
}

impl SqliteLineItemStore {
    /// Creates a store for the given cart.
    ///
    /// The cart row must exist before items are created, or the insert fails
    /// with `DbError::ForeignKeyViolation`.
    pub fn new(pool: SqlitePool, cart_id: impl Into<String>) -> Self {
        SqliteLineItemStore {
            pool,
            cart_id: cart_id.into(),
            price_currency: None,
        }
    }

    /// Registers the currency every stored price must be in.
    ///
    /// `create` then fails with `DbError::InvalidLineItem` for a price in
    /// any other currency.
    pub fn with_price_currency(mut self, currency: CurrencyCode) -> Self {
        self.price_currency = Some(currency);
        self
    }

    /// The cart this store is scoped to.
    pub fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn decode_all(rows: Vec<LineItemRow>) -> DbResult<Vec<LineItem>> {
        rows.into_iter().map(LineItem::try_from).collect()
    }
}

#[async_trait]
impl LineItemStore for SqliteLineItemStore {
    type Error = DbError;

    async fn find_by_product(&self, product: &ProductRef) -> DbResult<Option<LineItem>> {
        let row: Option<LineItemRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE cart_id = ?1 AND product_type = ?2 AND product_id = ?3"
        ))
        .bind(&self.cart_id)
        .bind(&product.product_type)
        .bind(&product.product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LineItem::try_from).transpose()
    }

    async fn create(
        &mut self,
        product: &ProductRef,
        unit_price: Money,
        quantity: i64,
    ) -> DbResult<LineItem> {
        if let Some(registered) = self.price_currency {
            if unit_price.currency() != registered {
                return Err(DbError::InvalidLineItem(format!(
                    "price in {}, store registers {}",
                    unit_price.currency(),
                    registered
                )));
            }
        }

        let item = LineItem::new(product.clone(), unit_price, quantity)?;

        debug!(cart_id = %self.cart_id, id = %item.id(), product = %product, "Inserting line item");

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, product_type, product_id,
                price_cents, currency, quantity,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(item.id())
        .bind(&self.cart_id)
        .bind(&item.product().product_type)
        .bind(&item.product().product_id)
        .bind(item.unit_price().cents())
        .bind(item.unit_price().currency().as_str())
        .bind(item.quantity())
        .bind(item.created_at())
        .bind(item.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Writes `quantity` and `updated_at`. The stored price is never rewritten.
    async fn save(&mut self, item: &LineItem) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?1, updated_at = ?2 WHERE id = ?3 AND cart_id = ?4",
        )
        .bind(item.quantity())
        .bind(item.updated_at())
        .bind(item.id())
        .bind(&self.cart_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LineItem", item.id()));
        }

        Ok(())
    }

    async fn delete(&mut self, item: &LineItem) -> DbResult<()> {
        debug!(cart_id = %self.cart_id, id = %item.id(), "Deleting line item");

        sqlx::query("DELETE FROM cart_items WHERE id = ?1 AND cart_id = ?2")
            .bind(item.id())
            .bind(&self.cart_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear(&mut self) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&self.cart_id)
            .execute(&self.pool)
            .await?;

        debug!(cart_id = %self.cart_id, removed = result.rows_affected(), "Cleared line items");
        Ok(())
    }

    async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
            .bind(&self.cart_id)
            .fetch_one(&self.pool)
            .await?;

        usize::try_from(count).map_err(|_| DbError::Decode(format!("row count {}", count)))
    }

    async fn first(&self) -> DbResult<Option<LineItem>> {
        let row: Option<LineItemRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE cart_id = ?1 ORDER BY rowid LIMIT 1"
        ))
        .bind(&self.cart_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LineItem::try_from).transpose()
    }

    async fn all(&self) -> DbResult<Vec<LineItem>> {
        let rows: Vec<LineItemRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE cart_id = ?1 ORDER BY rowid"))
                .bind(&self.cart_id)
                .fetch_all(&self.pool)
                .await?;

        Self::decode_all(rows)
    }

    fn registered_price_currency(&self) -> Option<CurrencyCode> {
        self.price_currency
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use basket_core::{CartAggregator, CartConfig, CartError, CoreError};

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    async fn cart_store(db: &Database) -> SqliteLineItemStore {
        let cart = db.carts().create().await.unwrap();
        db.line_items(cart.id)
    }

    #[tokio::test]
    async fn test_merge_keeps_first_price() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);
        let widget = ProductRef::new("Widget", "1");

        cart.add(&widget, usd(1000), 2, true).await.unwrap();
        cart.add(&widget, usd(1500), 3, true).await.unwrap();

        let items = cart.line_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity(), 5);
        assert_eq!(items[0].unit_price(), usd(1000));
        assert_eq!(cart.subtotal().await.unwrap(), usd(5000));
    }

    #[tokio::test]
    async fn test_non_cumulative_add_overwrites_quantity() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);
        let widget = ProductRef::new("Widget", "1");

        cart.add(&widget, usd(1000), 5, true).await.unwrap();
        cart.add(&widget, usd(1000), 2, false).await.unwrap();

        assert_eq!(cart.quantity_of(&widget).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_remove_decrements_then_deletes() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);
        let widget = ProductRef::new("Widget", "1");

        cart.add(&widget, usd(1000), 5, true).await.unwrap();
        cart.remove(&widget, 2).await.unwrap();
        assert_eq!(cart.quantity_of(&widget).await.unwrap(), 3);

        cart.remove(&widget, 10).await.unwrap();
        assert!(cart.is_empty().await.unwrap());

        // Absent product is a no-op
        cart.remove_one(&widget).await.unwrap();
    }

    #[tokio::test]
    async fn test_totals_with_default_tax() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);

        cart.add(&ProductRef::new("Book", "1"), usd(1000), 2, true)
            .await
            .unwrap();
        cart.add(&ProductRef::new("Book", "2"), usd(1000), 3, true)
            .await
            .unwrap();

        let totals = cart.totals().await.unwrap();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 5);
        assert_eq!(totals.subtotal, usd(5000));
        assert_eq!(totals.taxes, usd(413));
        assert_eq!(totals.total, usd(5413));
    }

    #[tokio::test]
    async fn test_iteration_order_and_currency_of_first_item() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);

        cart.add_one(&ProductRef::new("A", "1"), Money::from_cents(100, CurrencyCode::EUR))
            .await
            .unwrap();
        cart.add_one(&ProductRef::new("B", "1"), Money::from_cents(200, CurrencyCode::EUR))
            .await
            .unwrap();

        let types: Vec<_> = cart
            .line_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.product().product_type.clone())
            .collect();
        assert_eq!(types, vec!["A", "B"]);
        assert_eq!(cart.currency().await.unwrap(), CurrencyCode::EUR);
    }

    #[tokio::test]
    async fn test_empty_cart_uses_registered_currency() {
        let db = Database::in_memory().await.unwrap();
        let policy = CartConfig::default().with_registered_currency(CurrencyCode::GBP);
        let cart = CartAggregator::with_policy(cart_store(&db).await, policy);

        assert_eq!(cart.currency().await.unwrap(), CurrencyCode::GBP);
        assert_eq!(cart.total().await.unwrap(), Money::zero(CurrencyCode::GBP));
    }

    #[tokio::test]
    async fn test_mixed_currencies_fail_arithmetic() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(cart_store(&db).await);

        cart.add_one(&ProductRef::new("A", "1"), usd(100)).await.unwrap();
        cart.add_one(&ProductRef::new("B", "1"), Money::from_cents(100, CurrencyCode::EUR))
            .await
            .unwrap();

        let err = cart.subtotal().await.unwrap_err();
        assert!(matches!(
            err,
            CartError::Core(CoreError::CurrencyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_state_survives_new_store_handle() {
        let db = Database::in_memory().await.unwrap();
        let cart_row = db.carts().create().await.unwrap();
        let widget = ProductRef::new("Widget", "1");

        let mut first = CartAggregator::new(db.line_items(&cart_row.id));
        first.add(&widget, usd(250), 4, true).await.unwrap();
        drop(first);

        let second = CartAggregator::new(db.line_items(&cart_row.id));
        assert_eq!(second.quantity_of(&widget).await.unwrap(), 4);
        assert_eq!(second.subtotal().await.unwrap(), usd(1000));
    }

    #[tokio::test]
    async fn test_carts_are_isolated() {
        let db = Database::in_memory().await.unwrap();
        let widget = ProductRef::new("Widget", "1");

        let mut a = CartAggregator::new(cart_store(&db).await);
        let mut b = CartAggregator::new(cart_store(&db).await);

        a.add(&widget, usd(100), 1, true).await.unwrap();
        b.add(&widget, usd(900), 7, true).await.unwrap();
        a.clear().await.unwrap();

        assert!(a.is_empty().await.unwrap());
        assert_eq!(b.quantity_of(&widget).await.unwrap(), 7);
        assert_eq!(b.subtotal().await.unwrap(), usd(6300));
    }

    #[tokio::test]
    async fn test_deleting_cart_cascades_to_items() {
        let db = Database::in_memory().await.unwrap();
        let cart_row = db.carts().create().await.unwrap();
        let mut store = db.line_items(&cart_row.id);

        store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();
        store.create(&ProductRef::new("B", "1"), usd(1), 1).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        db.carts().delete(&cart_row.id).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_without_cart_row_fails() {
        let db = Database::in_memory().await.unwrap();
        let mut store = db.line_items("no-such-cart");

        let err = store
            .create(&ProductRef::new("A", "1"), usd(1), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_product_rejected_by_index() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await;
        let widget = ProductRef::new("Widget", "1");

        store.create(&widget, usd(1), 1).await.unwrap();
        let err = store.create(&widget, usd(1), 1).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_save_of_deleted_item_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await;

        let mut item = store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();
        store.delete(&item).await.unwrap();

        item.set_quantity(3).unwrap();
        let err = store.save(&item).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_currency_is_decode_error() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await;
        store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();

        sqlx::query("UPDATE cart_items SET currency = 'dollars'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = store.all().await.unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }

    #[tokio::test]
    async fn test_zero_quantity_row_is_decode_error() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await;
        store.create(&ProductRef::new("A", "1"), usd(1), 1).await.unwrap();

        sqlx::query("UPDATE cart_items SET quantity = 0")
            .execute(db.pool())
            .await
            .unwrap();

        let err = store.first().await.unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_quantity() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await;

        let err = store
            .create(&ProductRef::new("A", "1"), usd(1), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidLineItem(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_error_surfaces_through_aggregator() {
        let db = Database::in_memory().await.unwrap();
        let mut cart = CartAggregator::new(db.line_items("no-such-cart"));

        let err = cart
            .add_one(&ProductRef::new("A", "1"), usd(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Store(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_shared_cart_serialized_by_mutex() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let db = Database::in_memory().await.unwrap();
        let cart = Arc::new(Mutex::new(CartAggregator::new(cart_store(&db).await)));
        let widget = ProductRef::new("Widget", "1");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cart = Arc::clone(&cart);
            let widget = widget.clone();
            handles.push(tokio::spawn(async move {
                cart.lock().await.add_one(&widget, usd(100)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let cart = cart.lock().await;
        assert_eq!(cart.quantity_of(&widget).await.unwrap(), 10);
        assert_eq!(cart.item_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_registered_price_currency() {
        let db = Database::in_memory().await.unwrap();
        let store = cart_store(&db).await.with_price_currency(CurrencyCode::CAD);
        let mut cart = CartAggregator::new(store);
        let cad = |cents| Money::from_cents(cents, CurrencyCode::CAD);

        let err = cart
            .add_one(&ProductRef::new("A", "1"), usd(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Core(CoreError::CurrencyMismatch {
                expected: CurrencyCode::CAD,
                found: CurrencyCode::USD,
            })
        ));
        assert!(cart.is_empty().await.unwrap());

        cart.add(&ProductRef::new("A", "1"), cad(100), 2, true).await.unwrap();
        assert_eq!(cart.currency().await.unwrap(), CurrencyCode::CAD);
        assert_eq!(cart.subtotal().await.unwrap(), cad(200));
    }

    #[tokio::test]
    async fn test_create_outside_registered_price_currency_fails() {
        let db = Database::in_memory().await.unwrap();
        let mut store = cart_store(&db).await.with_price_currency(CurrencyCode::CAD);

        let err = store
            .create(&ProductRef::new("A", "1"), usd(100), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidLineItem(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
