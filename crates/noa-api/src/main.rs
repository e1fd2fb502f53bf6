//! NOA API: retrieval-augmented config generation with a review queue.
//!
//! Usage: `noa-api [config.toml]` (or `NOA_CONFIG=...`). Environment
//! variables and a `.env` file override the file settings.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use noa_api::config::ApiConfig;
use noa_api::db;
use noa_api::generation::OllamaClient;
use noa_api::push::CommandPushGateway;
use noa_api::routes::build_router;
use noa_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "noa-api starting");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NOA_CONFIG").ok());
    let config = ApiConfig::load(config_path.as_deref())
        .with_context(|| format!("loading config {config_path:?}"))?;

    tracing::info!(database = %config.database_path, "opening database");
    let pool = db::connect(&config.database_path).await?;

    let generator = OllamaClient::new(config.ollama.clone()).context("building ollama client")?;
    tracing::info!(host = %config.ollama.host, model = %config.ollama.model, "generation backend");

    let gateway = CommandPushGateway::new(&config.push).context("parsing push program")?;
    if !gateway.is_configured() {
        tracing::warn!("no push program configured; approvals will fail with status error");
    }

    let state = AppState::new(pool, Arc::new(generator), Arc::new(gateway), &config);
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
