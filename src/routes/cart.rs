use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::cart::{AddItemRequest, CartCreated},
    error::AppResult,
    extract::{AppJson, AppPath},
    models::{Cart, CartItem},
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/{id}", axum::routing::get(get_cart))
        .route("/{id}/items", post(add_item))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    responses(
        (status = 201, description = "Empty cart created", body = ApiResponse<CartCreated>)
    ),
    tag = "Cart"
)]
pub async fn create_cart(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartCreated>>)> {
    let id = cart_service::create_cart(state.store.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Cart created",
            CartCreated { id },
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/cart/{id}",
    params(
        ("id" = i64, Path, description = "Cart ID")
    ),
    responses(
        (status = 200, description = "Cart lines with current product data", body = ApiResponse<Cart>),
        (status = 400, description = "Invalid cart ID"),
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = cart_service::get_cart(state.store.as_ref(), id).await?;
    let meta = Meta::total(cart.items.len());
    Ok(Json(ApiResponse::success("OK", cart, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/cart/{id}/items",
    params(
        ("id" = i64, Path, description = "Cart ID")
    ),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added or quantity increased", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<AddItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartItem>>)> {
    let item = cart_service::add_item(state.store.as_ref(), id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Item added", item, Some(Meta::empty()))),
    ))
}
