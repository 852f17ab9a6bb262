use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::seed;
use super::store::{Store, StoreError};
use crate::auth::PasswordHasher;
use crate::config::{DatabaseConfig, StoreKind};

/// Opens pools, runs migrations and picks the store the server runs on
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;
        let url = url::Url::parse(raw).map_err(|_| StoreError::Unavailable("Invalid database URL".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url.as_str())
            .await?;

        info!("Connected to database at {}", Self::redacted(&url));
        Ok(pool)
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Store selected by configuration; the memory store is seeded when asked to
    pub async fn open_store(config: &DatabaseConfig, hasher: &PasswordHasher) -> anyhow::Result<Arc<dyn Store>> {
        match config.store {
            StoreKind::Postgres => {
                let pool = Self::connect(config).await?;
                Self::migrate(&pool).await?;
                Ok(Arc::new(PgStore::new(pool)))
            }
            StoreKind::Memory => {
                let store = MemoryStore::new();
                if config.seed_memory_store {
                    let summary = seed::seed(&store, hasher).await?;
                    info!("Seeded memory store: {}", summary);
                }
                Ok(Arc::new(store))
            }
        }
    }

    /// Connection string safe for logs
    fn redacted(url: &url::Url) -> String {
        let mut url = url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}
