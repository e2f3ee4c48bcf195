use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, MeResponse, RegisterRequest},
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Username taken or missing fields")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = register_user(&state.pool, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created", user, None)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&state.pool, &state.config, payload).await?;
    Ok(Json(ApiResponse::success(
        "Login successful",
        resp,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current login state", body = ApiResponse<MeResponse>)
    ),
    tag = "Auth"
)]
pub async fn me(user: Option<AuthUser>) -> Json<ApiResponse<MeResponse>> {
    let data = match user {
        Some(user) => MeResponse {
            logged_in: true,
            user_id: Some(user.user_id),
            username: Some(user.username),
        },
        None => MeResponse {
            logged_in: false,
            user_id: None,
            username: None,
        },
    };
    Json(ApiResponse::success("OK", data, Some(Meta::empty())))
}
