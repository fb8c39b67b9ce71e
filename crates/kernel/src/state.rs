//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::menu::{MemoryMenuStore, MenuStore, PgMenuStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Menu store. All menu reads and writes go through it.
    menus: Arc<dyn MenuStore>,

    /// Backend name, for logs and the health endpoint.
    backend: &'static str,
}

impl AppState {
    /// Create new application state, connecting to PostgreSQL when configured.
    pub async fn new(config: &Config) -> Result<Self> {
        let Some(database_url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set, menus are kept in memory and lost on exit");
            return Ok(Self::with_store(Arc::new(MemoryMenuStore::new()), "memory"));
        };

        let pool = db::create_pool(database_url, config.database_max_connections)
            .await
            .context("failed to create database pool")?;

        if config.run_migrations {
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
        }

        Ok(Self::with_store(Arc::new(PgMenuStore::new(pool)), "postgres"))
    }

    /// Build state around an existing store.
    pub fn with_store(menus: Arc<dyn MenuStore>, backend: &'static str) -> Self {
        Self {
            inner: Arc::new(AppStateInner { menus, backend }),
        }
    }

    /// Get the menu store.
    pub fn menus(&self) -> &Arc<dyn MenuStore> {
        &self.inner.menus
    }

    /// Name of the active store backend.
    pub fn backend(&self) -> &'static str {
        self.inner.backend
    }
}
