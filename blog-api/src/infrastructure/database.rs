use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::settings::DatabaseSettings;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .idle_timeout(settings.max_idle_time)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&settings.url)
        .await
        .context("failed to connect to database")?;

    tokio::time::timeout(ACQUIRE_TIMEOUT, sqlx::query("SELECT 1").execute(&pool))
        .await
        .context("database ping timed out")?
        .context("database ping failed")?;

    info!(
        max_connections = settings.max_connections,
        "database connection pool established"
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("database migrations applied");
    Ok(())
}
