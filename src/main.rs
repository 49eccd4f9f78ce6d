// Contabank - Account Management API server

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use contabank::{api, AppState, Config, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("failed to open database at {:?}", config.db_path))?;
    info!(db_path = %config.db_path.display(), "database opened");

    if config.api_token.is_none() {
        warn!("API_TOKEN is not set, requests will not be authenticated");
    }

    let state = AppState::new(Arc::new(store), config.api_token.clone());
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "contabank v{} listening", contabank::VERSION);

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
