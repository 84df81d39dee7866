use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use uuid::Uuid;

use crate::{
    entity::{Users, users::ActiveModel as UserActive},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Gives admin rights to another user. Granting to an existing admin is a no-op.
pub async fn grant_admin(
    state: &AppState,
    user: &AuthUser,
    target_id: Uuid,
) -> AppResult<ApiResponse<UserProfile>> {
    ensure_admin(state, user).await?;

    let target = Users::find_by_id(target_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let target = if target.is_admin {
        target
    } else {
        let mut active: UserActive = target.into();
        active.is_admin = Set(true);
        let updated = active.update(&state.orm).await?;
        tracing::info!(user_id = %updated.id, granted_by = %user.user_id, "admin granted");
        updated
    };

    Ok(ApiResponse::success(
        "Admin granted",
        UserProfile::from(target),
        Some(Meta::empty()),
    ))
}
