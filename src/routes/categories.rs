use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::products::CategoryList,
    error::AppResult,
    response::{ApiResponse, Meta},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Products"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let items = product_service::list_categories(&state.pool).await?;
    let meta = Meta::total(items.len());
    Ok(Json(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    )))
}
