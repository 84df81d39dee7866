use std::sync::Arc;

use crate::{
    category_tree::CategoryTree,
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    error::AppResult,
    services::settings_service::SettingsService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub settings: SettingsService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Loads (or creates) the settings document and wires the shared handles.
    pub async fn new(config: AppConfig, pool: DbPool) -> AppResult<Self> {
        let settings = SettingsService::load(pool.clone()).await?;
        Ok(Self::with_settings(config, pool, settings))
    }

    /// State with an in-memory category tree; nothing is read from the database.
    pub fn detached(config: AppConfig, pool: DbPool, tree: CategoryTree) -> Self {
        let settings = SettingsService::new(pool.clone(), tree);
        Self::with_settings(config, pool, settings)
    }

    fn with_settings(config: AppConfig, pool: DbPool, settings: SettingsService) -> Self {
        Self {
            orm: orm_from_pool(&pool),
            pool,
            settings,
            config: Arc::new(config),
        }
    }
}
