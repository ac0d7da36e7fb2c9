//! Application state

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tokio_util::sync::CancellationToken;

use task_core::cache::{CacheTtl, TaskListCache};
use task_core::db::Database;
use task_core::pagination::PageLimits;
use task_core::task::{SqliteTaskStore, StoreTaskRepository, TaskRepository};

use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    database: Database,
    repository: Arc<dyn TaskRepository>,
    list_cache: TaskListCache,
    page_limits: PageLimits,
    shutdown: CancellationToken,
}

impl AppState {
    /// Open the configured database and wire the repository and list cache over it
    pub async fn new(config: &AppConfig, shutdown: CancellationToken) -> task_core::Result<Self> {
        let database = if config.uses_in_memory_db() {
            Database::open_in_memory().await?
        } else {
            Database::open(&config.db_path).await?
        };

        Ok(Self::with_parts(
            database,
            Arc::new(DefaultClock),
            config.cache_ttl(),
            config.page_limits(),
            shutdown,
        ))
    }

    pub fn with_parts(
        database: Database,
        clock: Arc<dyn Clock + Send + Sync>,
        ttl: CacheTtl,
        page_limits: PageLimits,
        shutdown: CancellationToken,
    ) -> Self {
        let store = SqliteTaskStore::new(database.clone());
        let repository: Arc<dyn TaskRepository> =
            Arc::new(StoreTaskRepository::new(Arc::new(store)));
        let list_cache = TaskListCache::new(Arc::clone(&repository), clock, ttl);

        Self {
            inner: Arc::new(AppStateInner {
                database,
                repository,
                list_cache,
                page_limits,
                shutdown,
            }),
        }
    }

    pub fn database(&self) -> &Database {
        &self.inner.database
    }

    pub fn repository(&self) -> &dyn TaskRepository {
        self.inner.repository.as_ref()
    }

    pub fn list_cache(&self) -> &TaskListCache {
        &self.inner.list_cache
    }

    pub fn page_limits(&self) -> PageLimits {
        self.inner.page_limits
    }

    /// Cancelled when the server starts shutting down
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}
