use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{NewOrderLine, Store, StoreError, StoreResult, StoreTx};
use crate::models::{CartItem, CartLine, Order, OrderLine, ProductSummary};

#[derive(Debug, Clone, Copy, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Clone)]
struct OrderRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    product_seq: Sequence,
    cart_seq: Sequence,
    cart_item_seq: Sequence,
    order_seq: Sequence,
    order_item_seq: Sequence,
    products: BTreeMap<i64, ProductSummary>,
    carts: BTreeSet<i64>,
    cart_items: Vec<CartItem>,
    orders: Vec<OrderRow>,
    order_items: Vec<OrderLine>,
}

impl MemoryState {
    fn cart_lines(&self, cart_id: i64) -> Vec<CartLine> {
        self.cart_items
            .iter()
            .filter(|item| item.cart_id == cart_id)
            .filter_map(|item| {
                self.products.get(&item.product_id).map(|product| CartLine {
                    id: item.id,
                    cart_id: item.cart_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: product.clone(),
                })
            })
            .collect()
    }

    fn add_cart_item(
        &mut self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        if !self.carts.contains(&cart_id) {
            return Err(StoreError::Backend(format!(
                "cart_items.cart_id references unknown cart {cart_id}"
            )));
        }
        if !self.products.contains_key(&product_id) {
            return Err(StoreError::Backend(format!(
                "cart_items.product_id references unknown product {product_id}"
            )));
        }

        if let Some(item) = self
            .cart_items
            .iter_mut()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id)
        {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| StoreError::Backend("integer out of range".into()))?;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: self.cart_item_seq.next(),
            cart_id,
            product_id,
            quantity,
        };
        self.cart_items.push(item.clone());
        Ok(item)
    }

    fn orders_for_user(&self, user_id: i64) -> Vec<Order> {
        let mut rows: Vec<&OrderRow> = self
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        rows.into_iter()
            .map(|row| Order {
                id: row.id,
                user_id: row.user_id,
                created_at: row.created_at,
                items: self
                    .order_items
                    .iter()
                    .filter(|line| line.order_id == row.id)
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

/// In-process [`Store`]. A transaction holds the state lock for its whole
/// lifetime and writes to a staged copy that only replaces the live state on
/// commit, so concurrent checkouts are serialized and rollback is free.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    begun: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_product(&self, name: &str, price: i64) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.product_seq.next();
        state.products.insert(
            id,
            ProductSummary {
                id,
                name: name.to_string(),
                description: None,
                price,
                image_url: None,
            },
        );
        id
    }

    /// Changes the catalog price; existing order lines keep their captured price.
    pub async fn set_price(&self, product_id: i64, price: i64) -> bool {
        let mut state = self.state.lock().await;
        match state.products.get_mut(&product_id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn order_line_count(&self) -> usize {
        self.state.lock().await.order_items.len()
    }

    /// Number of transactions opened through [`Store::begin`].
    pub fn transactions_begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_cart(&self) -> StoreResult<i64> {
        let mut state = self.state.lock().await;
        let id = state.cart_seq.next();
        state.carts.insert(id);
        Ok(id)
    }

    async fn cart_exists(&self, cart_id: i64) -> StoreResult<bool> {
        Ok(self.state.lock().await.carts.contains(&cart_id))
    }

    async fn product_exists(&self, product_id: i64) -> StoreResult<bool> {
        Ok(self.state.lock().await.products.contains_key(&product_id))
    }

    async fn add_cart_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        self.state
            .lock()
            .await
            .add_cart_item(cart_id, product_id, quantity)
    }

    async fn cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        Ok(self.state.lock().await.cart_lines(cart_id))
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let live = self.state.clone().lock_owned().await;
        let staged = live.clone();
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTx { live, staged }))
    }

    async fn orders_for_user(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        Ok(self.state.lock().await.orders_for_user(user_id))
    }
}

struct MemoryTx {
    live: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_cart(&mut self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        Ok(self.staged.cart_lines(cart_id))
    }

    async fn insert_order(&mut self, user_id: i64, created_at: DateTime<Utc>) -> StoreResult<i64> {
        let id = self.staged.order_seq.next();
        self.staged.orders.push(OrderRow {
            id,
            user_id,
            created_at,
        });
        Ok(id)
    }

    async fn insert_order_line(&mut self, line: NewOrderLine) -> StoreResult<OrderLine> {
        if !self.staged.orders.iter().any(|o| o.id == line.order_id) {
            return Err(StoreError::Backend(format!(
                "order_items.order_id references unknown order {}",
                line.order_id
            )));
        }
        let row = OrderLine {
            id: self.staged.order_item_seq.next(),
            order_id: line.order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.price,
        };
        self.staged.order_items.push(row.clone());
        Ok(row)
    }

    async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64> {
        let before = self.staged.cart_items.len();
        self.staged.cart_items.retain(|item| item.cart_id != cart_id);
        Ok((before - self.staged.cart_items.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut live, staged } = *self;
        *live = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
