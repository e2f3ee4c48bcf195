use chrono::Utc;
use tracing::instrument;

use crate::{
    middleware::auth::AuthUser,
    models::Order,
    store::{NewOrderLine, Store, StoreResult, StoreTx},
};

#[derive(Debug)]
pub enum CheckoutOutcome {
    Created(Order),
    /// The cart had no lines; nothing was written.
    EmptyCart,
}

/// Turns the cart's current lines into an order and clears the cart.
///
/// The emptiness check runs before a transaction is opened. Inside the
/// transaction the cart is locked and re-read, so two checkouts of the same
/// cart cannot both materialize its lines; the loser sees an empty cart.
/// Each order line stores the unit price read under that lock. Any failure
/// after `begin` rolls back and is returned as is.
#[instrument(skip(store, user), fields(user_id = user.user_id))]
pub async fn checkout(
    store: &dyn Store,
    user: &AuthUser,
    cart_id: i64,
) -> StoreResult<CheckoutOutcome> {
    let lines = store.cart_lines(cart_id).await?;
    if lines.is_empty() {
        tracing::info!(cart_id, "checkout skipped: cart is empty");
        return Ok(CheckoutOutcome::EmptyCart);
    }

    let mut tx = store.begin().await?;
    let result = materialize(tx.as_mut(), user.user_id, cart_id).await;
    match result {
        Ok(Some(order)) => {
            tx.commit().await?;
            tracing::info!(
                cart_id,
                order_id = order.id,
                lines = order.items.len(),
                total = order.total(),
                "order created"
            );
            Ok(CheckoutOutcome::Created(order))
        }
        Ok(None) => {
            tx.rollback().await?;
            tracing::info!(cart_id, "checkout skipped: cart emptied concurrently");
            Ok(CheckoutOutcome::EmptyCart)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            tracing::error!(cart_id, error = %err, "checkout failed");
            Err(err)
        }
    }
}

async fn materialize(
    tx: &mut dyn StoreTx,
    user_id: i64,
    cart_id: i64,
) -> StoreResult<Option<Order>> {
    let lines = tx.lock_cart(cart_id).await?;
    if lines.is_empty() {
        return Ok(None);
    }

    let created_at = Utc::now();
    let order_id = tx.insert_order(user_id, created_at).await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = tx
            .insert_order_line(NewOrderLine {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.product.price,
            })
            .await?;
        items.push(item);
    }

    tx.clear_cart(cart_id).await?;

    Ok(Some(Order {
        id: order_id,
        user_id,
        created_at,
        items,
    }))
}

/// All orders placed by `user`, most recent first.
#[instrument(skip(store, user), fields(user_id = user.user_id))]
pub async fn list_orders(store: &dyn Store, user: &AuthUser) -> StoreResult<Vec<Order>> {
    let orders = store.orders_for_user(user.user_id).await?;
    tracing::debug!(count = orders.len(), "orders loaded");
    Ok(orders)
}
