use axum::{
    Json, Router,
    extract::State,
    routing::post,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::ApiPath,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}/grant-admin", post(grant_admin))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/grant-admin",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User is now an admin", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn grant_admin(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = admin_service::grant_admin(&state, &user, id).await?;
    Ok(Json(resp))
}
