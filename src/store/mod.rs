//! Store access for carts and orders.
//!
//! Components receive an `Arc<dyn Store>` instead of reaching for a global
//! handle, so the order workflow runs unchanged against Postgres
//! ([`SeaOrmStore`]) or the in-process [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CartItem, CartLine, Order, OrderLine};

mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::SeaOrmStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Values for one order line, priced from the cart snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn create_cart(&self) -> StoreResult<i64>;

    async fn cart_exists(&self, cart_id: i64) -> StoreResult<bool>;

    async fn product_exists(&self, product_id: i64) -> StoreResult<bool>;

    /// Adds `quantity` to the line for `(cart_id, product_id)`, inserting it if absent.
    async fn add_cart_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StoreResult<CartItem>;

    /// Lines joined with live product data, in insertion order. Empty for unknown carts.
    async fn cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>>;

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Newest first; ties on `created_at` put the higher id first.
    async fn orders_for_user(&self, user_id: i64) -> StoreResult<Vec<Order>>;
}

/// An open transaction. Dropping it without `commit` discards every write.
#[async_trait]
pub trait StoreTx: Send {
    /// Locks the cart until the transaction ends and re-reads its lines.
    async fn lock_cart(&mut self, cart_id: i64) -> StoreResult<Vec<CartLine>>;

    async fn insert_order(&mut self, user_id: i64, created_at: DateTime<Utc>) -> StoreResult<i64>;

    async fn insert_order_line(&mut self, line: NewOrderLine) -> StoreResult<OrderLine>;

    async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
