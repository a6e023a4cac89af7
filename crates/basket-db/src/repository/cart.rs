//! # Cart Repository
//!
//! Lifecycle of cart rows. Line items are handled per cart by
//! [`SqliteLineItemStore`](super::line_item::SqliteLineItemStore).
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Cart { id: uuid }                                   │
//! │                                                                         │
//! │  2. FILL                                                               │
//! │     └── CartAggregator::new(db.line_items(&cart.id)).add(...)          │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── delete() → cart row gone, cart_items cascade                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use basket_core::Cart;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Cart {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart rows.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Creates and stores an empty cart with a generated id.
    pub async fn create(&self) -> DbResult<Cart> {
        let cart = Cart::new();
        self.insert(&cart).await?;
        Ok(cart)
    }

    /// Inserts a cart built by the caller.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` if the id is already taken
    pub async fn insert(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, "Inserting cart");

        sqlx::query("INSERT INTO carts (id, created_at, updated_at) VALUES (?1, ?2, ?3)")
            .bind(&cart.id)
            .bind(cart.created_at)
            .bind(cart.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets a cart by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Cart>> {
        let row: Option<CartRow> =
            sqlx::query_as("SELECT id, created_at, updated_at FROM carts WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Cart::from))
    }

    /// Deletes a cart and, through the foreign key cascade, its line items.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if no cart has this id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting cart");

        let result = sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", id));
        }

        Ok(())
    }

    /// Number of stored carts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
