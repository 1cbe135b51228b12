use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Each variant identifies the pipeline stage that failed, so callers see an
/// actionable code rather than an internal stack state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Document acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Structured extraction failed")]
    StructuredExtractionFailed {
        /// Raw backend response kept for diagnostics; logged, never returned
        /// to the client verbatim.
        raw_response: String,
    },

    #[error("LLM backend unavailable (status {status}): {message}")]
    BackendUnavailable { status: u16, message: String },

    #[error("LLM backend endpoint not supported: {0}")]
    BackendUnsupported(String),

    #[error("Embedding index error: {0}")]
    Index(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidFormat(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_FORMAT", msg.clone())
            }
            AppError::AcquisitionFailed(msg) => {
                tracing::error!("Acquisition error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ACQUISITION_FAILED",
                    format!("Could not download document: {msg}"),
                )
            }
            AppError::CorruptDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CORRUPT_DOCUMENT",
                format!("Could not read PDF: {msg}"),
            ),
            AppError::StructuredExtractionFailed { raw_response } => {
                tracing::error!(
                    "Structured extraction failed; raw backend response: {raw_response}"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STRUCTURED_EXTRACTION_FAILED",
                    "The CV content could not be parsed into a structured record".to_string(),
                )
            }
            AppError::BackendUnavailable { status, message } => {
                tracing::error!("LLM backend error ({status}): {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNAVAILABLE",
                    "The extraction backend is unavailable".to_string(),
                )
            }
            AppError::BackendUnsupported(msg) => {
                tracing::error!("LLM backend unsupported: {msg}");
                (StatusCode::BAD_GATEWAY, "BACKEND_UNSUPPORTED", msg.clone())
            }
            AppError::Index(msg) => {
                tracing::error!("Embedding index error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INDEX_ERROR",
                    "An embedding index error occurred".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
