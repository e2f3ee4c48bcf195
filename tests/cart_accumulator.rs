use std::collections::HashMap;

use storefront_api::{
    dto::cart::AddItemRequest,
    error::AppError,
    services::cart_service,
    store::{MemoryStore, Store},
};

fn add(product_id: i64, quantity: i32) -> AddItemRequest {
    AddItemRequest {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn repeated_products_collapse_into_one_line_with_summed_quantity() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let cart = cart_service::create_cart(&store).await?;
    let hoodie = store.add_product("Axum Hoodie", 5500).await;
    let mug = store.add_product("Ferris Mug", 1200).await;
    let stickers = store.add_product("Sticker Pack", 500).await;

    let adds = [
        (hoodie, 1),
        (mug, 2),
        (hoodie, 3),
        (stickers, 10),
        (mug, 1),
        (hoodie, 2),
    ];
    let mut expected: HashMap<i64, i32> = HashMap::new();
    for (product_id, quantity) in adds {
        cart_service::add_item(&store, cart, add(product_id, quantity)).await?;
        *expected.entry(product_id).or_default() += quantity;
    }

    let cart = cart_service::get_cart(&store, cart).await?;
    assert_eq!(cart.items.len(), expected.len());
    for line in &cart.items {
        assert_eq!(Some(&line.quantity), expected.get(&line.product_id));
    }

    // lines keep the order in which each product was first added
    let order: Vec<i64> = cart.items.iter().map(|l| l.product_id).collect();
    assert_eq!(order, vec![hoodie, mug, stickers]);
    Ok(())
}

#[tokio::test]
async fn cart_read_shows_live_product_prices() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let cart = cart_service::create_cart(&store).await?;
    let mug = store.add_product("Ferris Mug", 1200).await;
    cart_service::add_item(&store, cart, add(mug, 1)).await?;

    store.set_price(mug, 1500).await;

    let cart = cart_service::get_cart(&store, cart).await?;
    assert_eq!(cart.items[0].product.price, 1500);
    assert_eq!(cart.items[0].product.name, "Ferris Mug");
    Ok(())
}

#[tokio::test]
async fn unknown_or_empty_cart_reads_as_empty() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let empty = cart_service::create_cart(&store).await?;

    assert!(cart_service::get_cart(&store, empty).await?.items.is_empty());

    let missing = cart_service::get_cart(&store, 9999).await?;
    assert_eq!(missing.id, 9999);
    assert!(missing.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_before_touching_the_store() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let cart = cart_service::create_cart(&store).await?;
    let mug = store.add_product("Ferris Mug", 1200).await;

    for quantity in [0, -3] {
        let err = cart_service::add_item(&store, cart, add(mug, quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    assert!(store.cart_lines(cart).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_cart_and_unknown_product_are_reported() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let cart = cart_service::create_cart(&store).await?;
    let mug = store.add_product("Ferris Mug", 1200).await;

    let err = cart_service::add_item(&store, cart + 100, add(mug, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = cart_service::add_item(&store, cart, add(mug + 100, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}
