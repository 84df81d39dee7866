//! Owner of the persisted category tree.
//!
//! The tree lives in the single `settings` row as serialized JSON and is mirrored in
//! memory for reads. Writes go through [`SettingsService::record_category`], which
//! serializes writers in-process with a mutex and across processes with a row lock.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    category_tree::CategoryTree,
    db::DbPool,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct SettingsService {
    pool: DbPool,
    tree: Arc<Mutex<CategoryTree>>,
}

impl SettingsService {
    pub fn new(pool: DbPool, tree: CategoryTree) -> Self {
        Self {
            pool,
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    /// Reads the settings row, creating it with an empty tree on first start.
    pub async fn load(pool: DbPool) -> AppResult<Self> {
        sqlx::query("INSERT INTO settings (id, category_tree) VALUES (1, '{}') ON CONFLICT (id) DO NOTHING")
            .execute(&pool)
            .await?;

        let (raw,): (String,) = sqlx::query_as("SELECT category_tree FROM settings WHERE id = 1")
            .fetch_one(&pool)
            .await?;
        let tree = parse_tree(&raw)?;

        tracing::info!(roots = tree.children().count(), "category tree loaded");
        Ok(Self::new(pool, tree))
    }

    pub async fn category_tree(&self) -> CategoryTree {
        self.tree.lock().await.clone()
    }

    /// Folds `path` into the persisted tree.
    ///
    /// The stored document is locked, unioned with the in-memory copy and the new
    /// path, and written back only when it changed. The in-memory tree is replaced
    /// after the commit, so a failed write leaves it untouched.
    pub async fn record_category(&self, path: &[String]) -> AppResult<()> {
        if path.is_empty() {
            return Ok(());
        }

        let mut guard = self.tree.lock().await;
        if guard.contains_path(path) {
            return Ok(());
        }

        let mut txn = self.pool.begin().await?;
        let (raw,): (String,) =
            sqlx::query_as("SELECT category_tree FROM settings WHERE id = 1 FOR UPDATE")
                .fetch_one(&mut *txn)
                .await?;

        let mut next = parse_tree(&raw)?;
        next.merge(guard.clone());
        next.insert_path(path);

        let serialized = next
            .to_json()
            .map_err(|e| AppError::Internal(e.into()))?;
        if serialized != raw {
            sqlx::query("UPDATE settings SET category_tree = $1, updated_at = NOW() WHERE id = 1")
                .bind(&serialized)
                .execute(&mut *txn)
                .await?;
        }
        txn.commit().await?;

        tracing::debug!(path = ?path, "category tree grew");
        *guard = next;
        Ok(())
    }
}

fn parse_tree(raw: &str) -> AppResult<CategoryTree> {
    CategoryTree::from_json(raw)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid category tree in settings: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> SettingsService {
        let pool = crate::db::create_lazy_pool("postgres://localhost/unused").unwrap();
        let mut tree = CategoryTree::new();
        tree.insert_path(&["Electronics", "Phones"]);
        SettingsService::new(pool, tree)
    }

    #[tokio::test]
    async fn known_paths_do_not_touch_the_database() {
        let service = detached();
        // Prefix of a stored path, so the call returns before dialing Postgres.
        service
            .record_category(&["Electronics".to_string()])
            .await
            .unwrap();
        service.record_category(&[]).await.unwrap();
        assert!(service
            .category_tree()
            .await
            .contains_path(&["Electronics", "Phones"]));
    }

    #[test]
    fn corrupt_document_is_an_internal_error() {
        assert!(matches!(parse_tree("not json"), Err(AppError::Internal(_))));
    }
}
