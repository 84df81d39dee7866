use std::path::Path;

use axum::extract::Multipart;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tokio::fs;
use uuid::Uuid;

use crate::{
    entity::{Items, items::ActiveModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Item,
    response::{ApiResponse, Meta},
    state::AppState,
};

const IMAGE_FIELD: &str = "image";

const IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    IMAGE_TYPES
        .iter()
        .find(|(_, known)| *known == ext)
        .map(|(mime, _)| *mime)
        .unwrap_or("application/octet-stream")
}

/// Stores the `image` field of a multipart body as `<upload_dir>/<item id>.<ext>`.
pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(state, user).await?;
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let ext = extension_for(&content_type).ok_or_else(|| {
            AppError::BadRequest(format!("unsupported image type '{content_type}'"))
        })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some((ext, bytes));
        break;
    }

    let (ext, bytes) =
        upload.ok_or_else(|| AppError::BadRequest(format!("missing '{IMAGE_FIELD}' field")))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("image is empty".into()));
    }

    let upload_dir = &state.config.upload_dir;
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let file_name = format!("{id}.{ext}");
    fs::write(upload_dir.join(&file_name), &bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if let Some(previous) = existing.image.as_deref().filter(|p| *p != file_name) {
        remove_image_file(upload_dir, previous).await;
    }

    let mut active: ActiveModel = existing.into();
    active.image = Set(Some(file_name));
    active.updated_at = Set(Utc::now().fixed_offset());
    let item = active.update(&state.orm).await?;

    tracing::info!(item_id = %id, bytes = bytes.len(), "image stored");
    Ok(ApiResponse::success(
        "Image uploaded",
        Item::from(item),
        Some(Meta::empty()),
    ))
}

/// Content type and bytes of the item's image.
pub async fn get_image(state: &AppState, id: Uuid) -> AppResult<(&'static str, Vec<u8>)> {
    let file_name = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .and_then(|item| item.image)
        .ok_or(AppError::NotFound)?;

    let bytes = match fs::read(state.config.upload_dir.join(&file_name)).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(item_id = %id, file = %file_name, "image file missing");
            return Err(AppError::NotFound);
        }
        Err(err) => return Err(AppError::Internal(err.into())),
    };
    Ok((content_type_for(&file_name), bytes))
}

pub async fn remove_image_file(upload_dir: &Path, file_name: &str) {
    if let Err(err) = fs::remove_file(upload_dir.join(file_name)).await {
        tracing::warn!(error = %err, file = %file_name, "failed to remove image file");
    }
}
