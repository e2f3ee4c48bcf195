use axum::{
    Json, Router,
    extract::State,
    routing::post,
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderResponse},
    error::{AppError, AppResult},
    extract::AppJson,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::order_service::{self, CheckoutOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_order).get(list_orders))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created from the cart", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Empty cart or invalid request body"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Store failure, nothing was written"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderResponse>>> {
    match order_service::checkout(state.store.as_ref(), &user, payload.cart_id).await? {
        CheckoutOutcome::Created(order) => Ok(Json(ApiResponse::success(
            "Order created",
            OrderResponse::from(order),
            Some(Meta::empty()),
        ))),
        CheckoutOutcome::EmptyCart => Err(AppError::BadRequest(
            "Cannot create an empty order".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders of the current user, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Not logged in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let orders = order_service::list_orders(state.store.as_ref(), &user).await?;
    let meta = Meta::total(orders.len());
    let items = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(ApiResponse::success("Ok", OrderList { items }, Some(meta))))
}
