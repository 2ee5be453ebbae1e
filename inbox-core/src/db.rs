use anyhow::{anyhow, Result};
use diesel::Connection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tracing;

use crate::config::DatabaseConfig;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection = Object<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the pool and waits until it can hand out a connection, retrying
/// with backoff per `config`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<Arc<DbPool>> {
    tracing::info!("Connecting to {}", mask_database_url(&config.url));

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    let pool = Pool::builder(manager)
        .max_size(config.max_connections as usize)
        .build()
        .map_err(|e| anyhow!("Failed to create connection pool: {}", e))?;

    wait_until_reachable(&pool, config).await?;
    Ok(Arc::new(pool))
}

async fn wait_until_reachable(pool: &DbPool, config: &DatabaseConfig) -> Result<()> {
    let attempts = config.connect_attempts();
    let mut attempt = 1;

    loop {
        let failure = match tokio::time::timeout(config.timeout(), pool.get()).await {
            Ok(Ok(_conn)) => {
                tracing::info!("Database reachable after {} attempt(s)", attempt);
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", config.timeout()),
        };

        if attempt >= attempts {
            tracing::error!("Giving up on database after {} attempts: {}", attempts, failure);
            return Err(anyhow!("Database unreachable after {} attempts: {}", attempts, failure));
        }

        let delay = config.retry_delay(attempt);
        tracing::warn!(
            "Database attempt {}/{} failed ({}), retrying in {:?}",
            attempt,
            attempts,
            failure,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Applies pending embedded migrations over a dedicated blocking connection.
pub async fn run_migrations(database_url: &str) -> Result<()> {
    let url = database_url.to_string();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&url)
            .map_err(|e| anyhow!("Failed to connect for migrations: {}", e))?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;

        if applied.is_empty() {
            tracing::info!("Database schema is up to date");
        }
        for version in applied {
            tracing::info!("Applied migration {}", version);
        }
        Ok(())
    })
    .await
    .map_err(|e| anyhow!("Migration task failed: {}", e))?
}

pub fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        let (before_at, after_at) = url.split_at(at_pos);
        if let Some(colon_pos) = before_at.rfind(':') {
            let (protocol_user, _password) = before_at.split_at(colon_pos);
            format!("{}:****{}", protocol_user, after_at)
        } else {
            "postgres://****@****".to_string()
        }
    } else {
        "Invalid URL format".to_string()
    }
}
