use std::sync::Arc;

use sqlx::PgPool;

use crate::embedding::EmbeddingIndex;
use crate::ingest::acquire::DriveClient;
use crate::ingest::extract::RawTextSink;
use crate::llm_client::TextCompletionBackend;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub index: EmbeddingIndex,
    pub drive: DriveClient,
    /// Hosted backend used by the default upload routes.
    pub llm: Arc<dyn TextCompletionBackend>,
    /// Local backend used by the `/upload_cv_ollama/` variant.
    pub ollama: Arc<dyn TextCompletionBackend>,
    /// Raw-text audit sink. Default logs a summary only; a file sink is an
    /// explicit opt-in via AUDIT_LOG_PATH.
    pub audit_sink: Arc<dyn RawTextSink>,
}
