use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use atelier_common::storage::WorkStore;
use tracing::{Level, info};

use atelier_server::config::AppConfig;
use atelier_server::services::locks::WorkLocks;
use atelier_server::state::AppState;
use atelier_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected and schema synced");

    seed::seed_admin(&db, &config).await?;

    let store = WorkStore::new(
        config.storage.uploads_root.clone(),
        config.storage.backups_root.clone(),
    )
    .await
    .context("Failed to initialize storage trees")?;

    let state = AppState {
        db,
        config: config.clone(),
        store: Arc::new(store),
        locks: Arc::new(WorkLocks::new()),
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
