//! # Repository Module
//!
//! SQLite-backed persistence for carts.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Database                                                              │
//! │  ├── carts()              → CartRepository                             │
//! │  │                           ├── create / insert                       │
//! │  │                           ├── get_by_id                             │
//! │  │                           ├── delete (cascades to items)            │
//! │  │                           └── count                                 │
//! │  │                                                                      │
//! │  └── line_items(cart_id)  → SqliteLineItemStore                        │
//! │                              └── impl LineItemStore (basket-core)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`](cart::CartRepository) - Cart row lifecycle
//! - [`SqliteLineItemStore`](line_item::SqliteLineItemStore) - Line items of one cart

pub mod cart;
pub mod line_item;
