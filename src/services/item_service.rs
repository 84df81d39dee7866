use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use uuid::Uuid;

use crate::{
    dto::items::{CategoryTreeResponse, ItemList, ItemRequest, ItemsQuery},
    entity::{Items, items::ActiveModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Item,
    response::{ApiResponse, Meta},
    services::{image_service, item_query},
    state::AppState,
    validation::Validate,
};

pub async fn query_items(state: &AppState, query: ItemsQuery) -> AppResult<ApiResponse<ItemList>> {
    let list = item_query::query_items(&state.orm, &query).await?;
    let meta = if query.items.is_some() {
        Meta::empty()
    } else {
        Meta::new(query.page, query.per_page, list.pages as i64)
    };
    Ok(ApiResponse::success("Items", list, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let item = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Item::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Item", item, None))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: ItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(state, user).await?;
    let payload = payload.normalized();
    payload.validate()?;

    let technical_details = details_json(&payload)?;
    let now = Utc::now().fixed_offset();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        price: Set(payload.price),
        description: Set(payload.description),
        category: Set(payload.category),
        technical_details: Set(technical_details),
        image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let item = active.insert(&state.orm).await?;

    // The item row is already committed; a failure here leaves the tree one path
    // behind, which the next write carrying that path repairs.
    state.settings.record_category(&item.category).await?;

    tracing::info!(item_id = %item.id, user_id = %user.user_id, "item created");
    Ok(ApiResponse::success(
        "Item created",
        Item::from(item),
        Some(Meta::empty()),
    ))
}

pub async fn edit_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(state, user).await?;
    let payload = payload.normalized();
    payload.validate()?;

    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let technical_details = details_json(&payload)?;
    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.price = Set(payload.price);
    active.description = Set(payload.description);
    active.category = Set(payload.category);
    active.technical_details = Set(technical_details);
    active.updated_at = Set(Utc::now().fixed_offset());
    let item = active.update(&state.orm).await?;

    state.settings.record_category(&item.category).await?;

    tracing::info!(item_id = %item.id, user_id = %user.user_id, "item updated");
    Ok(ApiResponse::success(
        "Updated",
        Item::from(item),
        Some(Meta::empty()),
    ))
}

/// Deletes the item, drops it from every favorites list and removes its image.
/// The category tree keeps the item's path.
pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(state, user).await?;
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let result = Items::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    let unfavorited = sqlx::query(
        "UPDATE users SET favorites = array_remove(favorites, $1) WHERE $1 = ANY(favorites)",
    )
    .bind(id)
    .execute(&state.pool)
    .await?
    .rows_affected();

    if let Some(file_name) = existing.image.as_deref() {
        image_service::remove_image_file(&state.config.upload_dir, file_name).await;
    }

    tracing::info!(item_id = %id, user_id = %user.user_id, unfavorited, "item deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn category_tree(state: &AppState) -> ApiResponse<CategoryTreeResponse> {
    let tree = state.settings.category_tree().await;
    ApiResponse::success("Categories", CategoryTreeResponse { tree }, None)
}

fn details_json(payload: &ItemRequest) -> AppResult<serde_json::Value> {
    serde_json::to_value(&payload.technical_details).map_err(|e| AppError::Internal(e.into()))
}
