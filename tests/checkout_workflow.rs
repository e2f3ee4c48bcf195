use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storefront_api::{
    middleware::auth::AuthUser,
    models::{CartItem, CartLine, Order, OrderLine},
    services::order_service::{self, CheckoutOutcome},
    store::{MemoryStore, NewOrderLine, Store, StoreError, StoreResult, StoreTx},
};

fn user(user_id: i64) -> AuthUser {
    AuthUser {
        user_id,
        username: format!("user-{user_id}"),
    }
}

fn created(outcome: CheckoutOutcome) -> Order {
    match outcome {
        CheckoutOutcome::Created(order) => order,
        CheckoutOutcome::EmptyCart => panic!("expected an order, cart was empty"),
    }
}

/// A cart with `lines` of (name, price, quantity).
async fn seeded_cart(store: &MemoryStore, lines: &[(&str, i64, i32)]) -> (i64, Vec<i64>) {
    let cart = store.create_cart().await.unwrap();
    let mut products = Vec::new();
    for (name, price, quantity) in lines {
        let product = store.add_product(name, *price).await;
        store.add_cart_item(cart, product, *quantity).await.unwrap();
        products.push(product);
    }
    (cart, products)
}

#[tokio::test]
async fn empty_cart_creates_nothing_and_opens_no_transaction() {
    let store = MemoryStore::new();
    let cart = store.create_cart().await.unwrap();

    let outcome = order_service::checkout(&store, &user(1), cart).await.unwrap();

    assert!(matches!(outcome, CheckoutOutcome::EmptyCart));
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.transactions_begun(), 0);
}

#[tokio::test]
async fn unknown_cart_checks_out_as_empty() {
    let store = MemoryStore::new();
    let outcome = order_service::checkout(&store, &user(1), 404).await.unwrap();
    assert!(matches!(outcome, CheckoutOutcome::EmptyCart));
    assert_eq!(store.transactions_begun(), 0);
}

#[tokio::test]
async fn checkout_prices_lines_and_clears_the_cart() {
    let store = MemoryStore::new();
    let (cart, products) =
        seeded_cart(&store, &[("Product A", 1000, 2), ("Product B", 500, 1)]).await;

    let order = created(order_service::checkout(&store, &user(7), cart).await.unwrap());

    assert_eq!(order.user_id, 7);
    let lines: Vec<(i64, i32, i64)> = order
        .items
        .iter()
        .map(|l| (l.product_id, l.quantity, l.price))
        .collect();
    assert_eq!(lines, vec![(products[0], 2, 1000), (products[1], 1, 500)]);
    assert!(order.items.iter().all(|l| l.order_id == order.id));
    assert_eq!(order.total(), 2500);

    assert!(store.cart_lines(cart).await.unwrap().is_empty());
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.order_line_count().await, 2);
}

#[tokio::test]
async fn n_distinct_lines_become_exactly_n_order_lines() {
    let store = MemoryStore::new();
    let (cart, _) = seeded_cart(
        &store,
        &[("A", 100, 1), ("B", 200, 2), ("C", 300, 3), ("D", 400, 4)],
    )
    .await;

    let order = created(order_service::checkout(&store, &user(1), cart).await.unwrap());

    assert_eq!(order.items.len(), 4);
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.order_line_count().await, 4);
    assert_eq!(store.transactions_begun(), 1);
}

#[tokio::test]
async fn later_price_changes_do_not_touch_placed_orders() {
    let store = MemoryStore::new();
    let (cart, products) = seeded_cart(&store, &[("Ferris Mug", 1200, 3)]).await;

    created(order_service::checkout(&store, &user(3), cart).await.unwrap());
    store.set_price(products[0], 9900).await;

    let orders = order_service::list_orders(&store, &user(3)).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].items[0].price, 1200);
    assert_eq!(orders[0].total(), 3600);
}

#[tokio::test]
async fn orders_are_listed_newest_first_with_their_lines() {
    let store = MemoryStore::new();
    let (first_cart, _) = seeded_cart(&store, &[("A", 100, 1)]).await;
    let (second_cart, _) = seeded_cart(&store, &[("B", 200, 1), ("C", 300, 2)]).await;

    let first = created(order_service::checkout(&store, &user(5), first_cart).await.unwrap());
    let second = created(order_service::checkout(&store, &user(5), second_cart).await.unwrap());

    let orders = order_service::list_orders(&store, &user(5)).await.unwrap();
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(orders[0].items, second.items);
    assert_eq!(orders[1].items, first.items);
}

#[tokio::test]
async fn user_without_orders_gets_an_empty_list() {
    let store = MemoryStore::new();
    let (cart, _) = seeded_cart(&store, &[("A", 100, 1)]).await;
    created(order_service::checkout(&store, &user(1), cart).await.unwrap());

    let orders = order_service::list_orders(&store, &user(2)).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_create_a_single_order() {
    let store = Arc::new(MemoryStore::new());
    let (cart, _) = seeded_cart(&store, &[("A", 100, 1), ("B", 200, 1)]).await;

    let alice = user(1);
    let bob = user(2);
    let (a, b) = tokio::join!(
        order_service::checkout(store.as_ref(), &alice, cart),
        order_service::checkout(store.as_ref(), &bob, cart),
    );

    let created = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(|o| matches!(o, CheckoutOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.order_line_count().await, 2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Begin,
    OrderLine,
    ClearCart,
    Commit,
}

/// Delegates to a [`MemoryStore`] but fails one transactional step.
struct FailingStore {
    inner: MemoryStore,
    fail_at: FailAt,
}

fn injected() -> StoreError {
    StoreError::Backend("injected failure".into())
}

#[async_trait]
impl Store for FailingStore {
    async fn create_cart(&self) -> StoreResult<i64> {
        self.inner.create_cart().await
    }

    async fn cart_exists(&self, cart_id: i64) -> StoreResult<bool> {
        self.inner.cart_exists(cart_id).await
    }

    async fn product_exists(&self, product_id: i64) -> StoreResult<bool> {
        self.inner.product_exists(product_id).await
    }

    async fn add_cart_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        self.inner.add_cart_item(cart_id, product_id, quantity).await
    }

    async fn cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        self.inner.cart_lines(cart_id).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        if self.fail_at == FailAt::Begin {
            return Err(injected());
        }
        Ok(Box::new(FailingTx {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
        }))
    }

    async fn orders_for_user(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        self.inner.orders_for_user(user_id).await
    }
}

struct FailingTx {
    inner: Box<dyn StoreTx>,
    fail_at: FailAt,
}

#[async_trait]
impl StoreTx for FailingTx {
    async fn lock_cart(&mut self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        self.inner.lock_cart(cart_id).await
    }

    async fn insert_order(&mut self, user_id: i64, created_at: DateTime<Utc>) -> StoreResult<i64> {
        self.inner.insert_order(user_id, created_at).await
    }

    async fn insert_order_line(&mut self, line: NewOrderLine) -> StoreResult<OrderLine> {
        if self.fail_at == FailAt::OrderLine {
            return Err(injected());
        }
        self.inner.insert_order_line(line).await
    }

    async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64> {
        if self.fail_at == FailAt::ClearCart {
            return Err(injected());
        }
        self.inner.clear_cart(cart_id).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.fail_at == FailAt::Commit {
            // dropping the inner transaction discards its writes
            return Err(injected());
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn failure_mid_transaction_rolls_everything_back() {
    for fail_at in [FailAt::Begin, FailAt::OrderLine, FailAt::ClearCart, FailAt::Commit] {
        let memory = MemoryStore::new();
        let (cart, _) = seeded_cart(&memory, &[("A", 1000, 2), ("B", 500, 1)]).await;
        let store = FailingStore {
            inner: memory.clone(),
            fail_at,
        };

        let err = order_service::checkout(&store, &user(1), cart)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "injected failure", "{fail_at:?}");
        assert_eq!(memory.order_count().await, 0, "{fail_at:?}");
        assert_eq!(memory.order_line_count().await, 0, "{fail_at:?}");
        let lines = memory.cart_lines(cart).await.unwrap();
        assert_eq!(lines.len(), 2, "{fail_at:?}");
        assert_eq!(lines[0].quantity, 2, "{fail_at:?}");
    }
}

#[tokio::test]
async fn cart_survives_a_failed_checkout_and_can_be_retried() {
    let memory = MemoryStore::new();
    let (cart, _) = seeded_cart(&memory, &[("A", 1000, 2)]).await;
    let failing = FailingStore {
        inner: memory.clone(),
        fail_at: FailAt::OrderLine,
    };

    assert!(order_service::checkout(&failing, &user(1), cart).await.is_err());

    let order = created(order_service::checkout(&memory, &user(1), cart).await.unwrap());
    assert_eq!(order.total(), 2000);
    assert!(memory.cart_lines(cart).await.unwrap().is_empty());
}
