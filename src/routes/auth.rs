use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{SignInRequest, SignInResponse, SignUpRequest},
    error::AppResult,
    extract::ApiJson,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email, login or phone already taken")
    ),
    tag = "Auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let resp = auth_service::sign_up(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SignInResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> AppResult<Json<ApiResponse<SignInResponse>>> {
    let resp = auth_service::sign_in(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::me(&state, &user).await?;
    Ok(Json(resp))
}
