use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store};
use crate::services::{AuthService, DashboardService, ResourceService};

/// Everything a handler needs, injected through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub resources: ResourceService,
    pub auth: AuthService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, passwords: PasswordHasher) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config.security)?;

        Ok(Self {
            resources: ResourceService::new(store.clone(), passwords.clone()),
            auth: AuthService::new(store.clone(), tokens.clone(), passwords),
            dashboard: DashboardService::new(store.clone()),
            config: Arc::new(config),
            store,
            tokens,
        })
    }

    /// Opens the configured store, then wires the services onto it
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let passwords = PasswordHasher::new(config.security.bcrypt_cost);
        let store = DatabaseManager::open_store(&config.database, &passwords).await?;
        tracing::info!("Using {} store", store.name());
        Self::new(config, store, passwords)
    }
}
