mod config;
mod db;
mod embedding;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod search;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::embedding::{EmbeddingClient, EmbeddingIndex};
use crate::ingest::acquire::DriveClient;
use crate::ingest::extract::{FileSink, RawTextSink, TracingSink};
use crate::llm_client::{GeminiBackend, OllamaBackend};
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

    info!("Starting CV API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and bootstrap the candidate tables
    let pool = create_pool(&config.database_url).await?;
    init_schema(&pool).await?;

    // Initialize the embedding index (Qdrant + embedding endpoint)
    let embedder = EmbeddingClient::new(&config.embedding_url, config.embedding_model.clone());
    let index = EmbeddingIndex::new(&config.qdrant_url, config.embedding_dim, embedder);
    index.ensure_collection().await.map_err(|e| anyhow::anyhow!("{e}"))?;

    // Initialize the extraction backends
    let llm: Arc<dyn llm_client::TextCompletionBackend> =
        Arc::new(GeminiBackend::new(config.gemini_api_key.clone()));
    let ollama: Arc<dyn llm_client::TextCompletionBackend> =
        Arc::new(OllamaBackend::new(config.ollama_url.clone()));
    info!("Extraction backends initialized");

    // Raw-text audit sink: file sink only when explicitly configured
    let audit_sink: Arc<dyn RawTextSink> = match &config.audit_log_path {
        Some(path) => {
            info!("Raw-text audit sink writing to {path}");
            Arc::new(FileSink::new(path))
        }
        None => Arc::new(TracingSink),
    };

    // Drive download client
    let drive = DriveClient::new(config.drive_download_url.clone());

    // Build app state
    let state = AppState {
        db: pool,
        index,
        drive,
        llm,
        ollama,
        audit_sink,
    };

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
