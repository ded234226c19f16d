use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::services::notifications::Notifier;
use crate::ws::ConnectionRegistry;

/// Shared application state, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub registry: ConnectionRegistry,
    pub notifier: Notifier,
}

impl AppState {
    pub async fn initialize(config: Config) -> Result<Self> {
        let pool = db::init_pool(&config.database).await?;
        let registry = ConnectionRegistry::new();
        let notifier = Notifier::new(pool.clone(), registry.clone());

        Ok(Self {
            db: pool,
            config: Arc::new(config),
            registry,
            notifier,
        })
    }
}
