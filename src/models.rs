use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{items, users};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub description: String,
    pub category: Vec<String>,
    pub technical_details: BTreeMap<String, String>,
    /// Path of the image endpoint when an image has been uploaded.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as returned to clients; the password hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub login: String,
    pub phone: String,
    pub firstname: String,
    pub lastname: String,
    pub address: String,
    pub favorites: Vec<Uuid>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<items::Model> for Item {
    fn from(model: items::Model) -> Self {
        // Rows are only written from validated string maps; anything else reads as empty.
        let technical_details = technical_details_of(model.id, model.technical_details);
        let image_url = model
            .image
            .as_ref()
            .map(|_| format!("/api/items/{}/image", model.id));
        Item {
            id: model.id,
            name: model.name,
            price: model.price,
            description: model.description,
            category: model.category,
            technical_details,
            image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

fn technical_details_of(id: Uuid, raw: serde_json::Value) -> BTreeMap<String, String> {
    match serde_json::from_value(raw) {
        Ok(details) => details,
        Err(err) => {
            tracing::warn!(item_id = %id, error = %err, "malformed technical_details, returning empty map");
            BTreeMap::new()
        }
    }
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        UserProfile {
            id: model.id,
            email: model.email,
            login: model.login,
            phone: model.phone,
            firstname: model.firstname,
            lastname: model.lastname,
            address: model.address,
            favorites: model.favorites,
            is_admin: model.is_admin,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
