pub mod admin_service;
pub mod auth_service;
pub mod favorite_service;
pub mod image_service;
pub mod item_query;
pub mod item_service;
pub mod settings_service;
