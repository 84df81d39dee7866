use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::items::{ItemList, ItemRequest, ItemsQuery},
    error::AppResult,
    extract::{ApiJson, ApiPath},
    middleware::auth::AuthUser,
    models::Item,
    response::ApiResponse,
    services::{image_service, item_service},
    state::AppState,
};

/// Multipart body of an image upload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/query", post(query_items))
        .route(
            "/{id}",
            get(get_item).put(edit_item).delete(remove_item),
        )
        // Uploads are bounded by the global request body limit instead.
        .route(
            "/{id}/image",
            get(get_image)
                .post(upload_image)
                .layer(DefaultBodyLimit::disable()),
        )
}

#[utoipa::path(
    post,
    path = "/api/items/query",
    request_body = ItemsQuery,
    responses(
        (status = 200, description = "Filtered, sorted page of items", body = ApiResponse<ItemList>),
        (status = 400, description = "Invalid query"),
    ),
    tag = "Items"
)]
pub async fn query_items(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<ItemsQuery>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = item_service::query_items(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Get item", body = ApiResponse<Item>),
        (status = 404, description = "Item not found"),
    ),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::get_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/items",
    request_body = ItemRequest,
    responses(
        (status = 201, description = "Create item", body = ApiResponse<Item>),
        (status = 400, description = "Invalid item"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Item>>)> {
    let resp = item_service::create_item(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Updated item", body = ApiResponse<Item>),
        (status = 400, description = "Invalid item"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn edit_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ItemRequest>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::edit_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Deleted item", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = item_service::remove_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/items/{id}/image",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = ApiResponse<Item>),
        (status = 400, description = "Missing or unsupported image"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = image_service::upload_image(&state, &user, id, multipart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/image",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Item or image not found"),
    ),
    tag = "Items"
)]
pub async fn get_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Response> {
    let (content_type, bytes) = image_service::get_image(&state, id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
