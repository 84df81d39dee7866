use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::{favorites::AddFavoriteRequest, items::ItemList},
    entity::Items,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
    services::{
        auth_service::current_user,
        item_query::{QueryPlan, run_plan},
    },
    state::AppState,
};

/// Resolves the caller's favorites through the explicit-id path of the item query.
pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ItemList>> {
    let account = current_user(state, user).await?;
    let list = run_plan(&state.orm, &QueryPlan::Explicit(account.favorites)).await?;
    Ok(ApiResponse::success("OK", list, Some(Meta::empty())))
}

/// Adding an item that is already a favorite leaves the list unchanged.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    if Items::find_by_id(payload.item_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET favorites = array_append(favorites, $2)
        WHERE id = $1 AND NOT ($2 = ANY(favorites))
        "#,
    )
    .bind(user.user_id)
    .bind(payload.item_id)
    .execute(&state.pool)
    .await?;

    let account = current_user(state, user).await?;
    if result.rows_affected() > 0 {
        tracing::info!(user_id = %user.user_id, item_id = %payload.item_id, "favorite added");
    }

    Ok(ApiResponse::success(
        "Added to favorites",
        UserProfile::from(account),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<UserProfile>> {
    let result = sqlx::query(
        "UPDATE users SET favorites = array_remove(favorites, $2) WHERE id = $1 AND $2 = ANY(favorites)",
    )
    .bind(user.user_id)
    .bind(item_id)
    .execute(&state.pool)
    .await?;

    let account = current_user(state, user).await?;
    if result.rows_affected() > 0 {
        tracing::info!(user_id = %user.user_id, item_id = %item_id, "favorite removed");
    }

    Ok(ApiResponse::success(
        "Removed from favorites",
        UserProfile::from(account),
        Some(Meta::empty()),
    ))
}
