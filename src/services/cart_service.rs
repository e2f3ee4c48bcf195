use tracing::instrument;

use crate::{
    dto::cart::AddItemRequest,
    error::{AppError, AppResult},
    models::{Cart, CartItem},
    store::Store,
};

#[instrument(skip(store))]
pub async fn create_cart(store: &dyn Store) -> AppResult<i64> {
    let id = store.create_cart().await?;
    tracing::debug!(cart_id = id, "cart created");
    Ok(id)
}

/// Adds to the quantity of an existing line or inserts a new one.
#[instrument(skip(store))]
pub async fn add_item(
    store: &dyn Store,
    cart_id: i64,
    payload: AddItemRequest,
) -> AppResult<CartItem> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    if !store.cart_exists(cart_id).await? {
        return Err(AppError::NotFound);
    }
    if !store.product_exists(payload.product_id).await? {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let item = store
        .add_cart_item(cart_id, payload.product_id, payload.quantity)
        .await?;
    tracing::debug!(
        cart_id,
        product_id = item.product_id,
        quantity = item.quantity,
        "cart line updated"
    );
    Ok(item)
}

/// Current lines with live product data. Unknown carts read as empty.
#[instrument(skip(store))]
pub async fn get_cart(store: &dyn Store, cart_id: i64) -> AppResult<Cart> {
    let items = store.cart_lines(cart_id).await?;
    Ok(Cart { id: cart_id, items })
}
