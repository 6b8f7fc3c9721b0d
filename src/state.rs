use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{AppConfig, StoreKind};
use crate::store::{DocumentStore, MemoryStore, PgStore};

/// Connects and applies `migrations/`. Either failure aborts startup.
async fn connect_postgres(url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;
    Ok(db)
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres store")?;
                let db = connect_postgres(url).await?;
                tracing::info!("connected to postgres");
                Arc::new(PgStore::new(db)) as Arc<dyn DocumentStore>
            }
            StoreKind::Memory => {
                tracing::info!("using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// In-memory store with the test JWT configuration.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(AppConfig::for_tests()),
        )
    }
}
