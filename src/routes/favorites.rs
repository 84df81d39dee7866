use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::{favorites::AddFavoriteRequest, items::ItemList},
    error::AppResult,
    extract::{ApiJson, ApiPath},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{item_id}", delete(remove_favorite))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = favorite_service::remove_favorite(&state, &user, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "Favorite items", body = ApiResponse<ItemList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = favorite_service::list_favorites(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 200, description = "Added to favorites", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AddFavoriteRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = favorite_service::add_favorite(&state, &user, payload).await?;
    Ok(Json(resp))
}
