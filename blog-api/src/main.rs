use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use infrastructure::background::BackgroundTasks;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::mailer::{MailTemplates, SmtpMailer};
use infrastructure::metrics::HttpMetrics;
use infrastructure::rate_limiter::ClientRateLimiter;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;

    let templates = Arc::new(MailTemplates::new().context("failed to load mail templates")?);
    let mailer = Arc::new(SmtpMailer::new(&settings.smtp).context("failed to configure SMTP")?);
    let background = BackgroundTasks::new();

    let rate_limiter = Arc::new(ClientRateLimiter::new(&settings.limiter)?);
    let sweeper = rate_limiter
        .is_enabled()
        .then(|| rate_limiter.spawn_sweeper(settings.limiter.sweep_interval));

    let metrics = Arc::new(HttpMetrics::new().context("failed to register metrics")?);
    metrics.set_build_info(env!("CARGO_PKG_VERSION"), settings.environment);

    let state = AppState::new(
        pool.clone(),
        &settings,
        mailer,
        templates,
        background.clone(),
        rate_limiter,
        metrics,
    );

    let served = server::run_http(&settings, state).await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    background.shutdown().await;
    pool.close().await;
    info!("shutdown complete");

    served
}
