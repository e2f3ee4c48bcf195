use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/reviews", get(list_reviews).post(create_review))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reviews for a product, newest first", body = ApiResponse<ReviewList>),
        (status = 400, description = "Invalid product ID"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let items = review_service::list_reviews(&state.pool, id).await?;
    let meta = Meta::total(items.len());
    Ok(Json(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or request body"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let review = review_service::create_review(&state.pool, &user, id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review created", review, Some(Meta::empty()))),
    ))
}
