mod config;
mod discovery;
mod errors;
mod matching;
mod models;
mod parsing;
mod providers;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::providers::{Embedder, HashingEmbedder, HttpArtifactFetcher, HttpEmbedder, HttpSearchProvider};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scout API v{}", env!("CARGO_PKG_VERSION"));

    let search = Arc::new(HttpSearchProvider::new(
        config.search_api_url.clone(),
        config.search_api_key.clone(),
        config.search_results_per_query,
        config.fetch_timeout(),
    )?);
    info!("Search provider initialized ({})", config.search_api_url);

    let fetcher = Arc::new(HttpArtifactFetcher::new(
        config.artifacts_dir.clone(),
        config.fetch_timeout(),
    )?
    .with_max_bytes(config.max_artifact_bytes));
    info!("Artifacts stored in {}", config.artifacts_dir.display());

    let embedder = build_embedder(&config)?;
    info!("Embedder initialized ({})", embedder.name());

    let state = AppState::new(config.clone(), search, fetcher, embedder)?;
    info!(
        "Discovery: max_downloads={} workers={} weights={:?}",
        state.discovery.max_downloads, state.discovery.workers, config.weights
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Remote embeddings when `EMBEDDING_API_URL` is set, the local hashing embedder otherwise.
fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match &config.embedding_api_url {
        Some(url) => Ok(Arc::new(HttpEmbedder::new(
            url.clone(),
            config.embedding_api_key.clone(),
            config.embedding_model.clone(),
            config.fetch_timeout(),
        )?)),
        None => Ok(Arc::new(HashingEmbedder::default())),
    }
}
