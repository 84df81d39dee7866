use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::items::CategoryTreeResponse, response::ApiResponse, services::item_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(category_tree))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Nested category tree", body = ApiResponse<CategoryTreeResponse>)
    ),
    tag = "Categories"
)]
pub async fn category_tree(State(state): State<AppState>) -> Json<ApiResponse<CategoryTreeResponse>> {
    Json(item_service::category_tree(&state).await)
}
