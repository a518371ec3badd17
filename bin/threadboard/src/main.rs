//! # Threadboard Binary
//!
//! Assembles the store plugin, the feed service and the HTTP router from
//! layered settings, then serves until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tb_api::{router, AppState};
use tb_config::{LogFormat, LoggingSettings, Settings};
use tb_core::{FeedOptions, FeedService, PerPage, PostRepo, ReplyDepth};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "db-sqlite")]
use tb_db_sqlite::SqliteRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.logging);

    let repo = connect_store(&settings).await?;
    let feed = FeedService::new(repo, feed_options(&settings)?);
    let app = router(AppState::new(feed));

    let bind = settings.bind_address();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("threadboard listening on http://{bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

/// `RUST_LOG` wins over the configured filter when set.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

fn feed_options(settings: &Settings) -> anyhow::Result<FeedOptions> {
    Ok(FeedOptions {
        per_page: PerPage::new(settings.feed.per_page)?,
        reply_depth: ReplyDepth::new(settings.feed.reply_depth)?,
        path: settings.feed.path.clone(),
    })
}

#[cfg(feature = "db-sqlite")]
async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn PostRepo>> {
    let repo = SqliteRepo::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open {}", settings.database.url))?;
    if settings.database.run_migrations {
        repo.migrate().await?;
        info!("migrations applied");
    }
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "db-sqlite"))]
async fn connect_store(_settings: &Settings) -> anyhow::Result<Arc<dyn PostRepo>> {
    anyhow::bail!("no store plugin compiled in; enable the `db-sqlite` feature")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
