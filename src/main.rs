mod config;
mod error;
mod models;
mod pages;
mod routes;
mod services;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::routes::AppState;
use crate::services::chain::PromptChain;
use crate::services::llm::OpenAiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Phase one: configuration, client and the full route table.
    let config = Config::from_env().context("failed to read configuration")?;
    tracing::info!(api_key_present = config.api_key_present(), "Loaded configuration");
    if !config.api_key_present() {
        tracing::warn!("OPENAI_API_KEY is not set; completion requests will fail");
    }

    let llm = Arc::new(OpenAiClient::new(&config).context("failed to build completion client")?);
    let chain = Arc::new(PromptChain::new().context("invalid prompt templates")?);
    let app = routes::router(AppState { llm, chain }, &config.static_dir);

    // Phase two: bind and serve.
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
