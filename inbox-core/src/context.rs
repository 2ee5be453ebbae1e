use std::sync::Arc;
use crate::config::{Config, StoreBackend};
use crate::db::run_migrations;
use crate::memory_store::MemoryInboxStore;
use crate::pg_store::PgInboxStore;
use crate::store::InboxStore;

#[derive(Clone)]
pub struct InboxContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn InboxStore>,
}

impl InboxContext {
    /// Connects to the configured backend. For Postgres the pool is
    /// established (with retries) before pending migrations are applied.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn InboxStore> = match config.store {
            StoreBackend::Postgres => {
                let store = PgInboxStore::connect(&config.database).await?;
                run_migrations(&config.database.url).await?;
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data will not survive a restart");
                Arc::new(MemoryInboxStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn InboxStore>) -> Self {
        InboxContext {
            config: Arc::new(config),
            store,
        }
    }
}
