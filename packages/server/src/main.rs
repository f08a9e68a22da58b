use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemMediaStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nursery_server::config::AppConfig;
use nursery_server::state::AppState;
use nursery_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database schema synced");

    if config.seed.sample_catalog {
        let created = seed::seed_sample_catalog(&db)
            .await
            .context("Failed to seed sample catalog")?;
        info!(created, "Sample catalog ready");
    }

    let media = FilesystemMediaStore::new(config.media.root.clone(), config.media.max_upload_size)
        .await
        .context("Failed to initialize media store")?;
    info!(root = %config.media.root.display(), "Media store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        media: Arc::new(media),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
