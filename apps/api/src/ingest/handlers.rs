use axum::{
    extract::{Multipart, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::acquire::{acquire_from_upload, AcquiredDocument};
use crate::ingest::pipeline::ingest_document;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub candidate_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DriveUploadForm {
    pub google_drive_url: String,
}

/// POST /upload_cv/
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let doc = document_from_multipart(multipart).await?;
    let candidate_id = ingest_document(
        &state.db,
        &state.index,
        state.audit_sink.as_ref(),
        state.llm.as_ref(),
        doc,
    )
    .await?;
    Ok(Json(UploadResponse {
        status: "success",
        candidate_id,
    }))
}

/// POST /upload_cv_ollama/ — same flow on the locally hosted backend.
pub async fn handle_upload_cv_ollama(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let doc = document_from_multipart(multipart).await?;
    let candidate_id = ingest_document(
        &state.db,
        &state.index,
        state.audit_sink.as_ref(),
        state.ollama.as_ref(),
        doc,
    )
    .await?;
    Ok(Json(UploadResponse {
        status: "success",
        candidate_id,
    }))
}

/// POST /upload_cv_from_drive/
pub async fn handle_upload_cv_from_drive(
    State(state): State<AppState>,
    Form(form): Form<DriveUploadForm>,
) -> Result<Json<UploadResponse>, AppError> {
    let doc = state.drive.fetch(&form.google_drive_url).await?;
    let candidate_id = ingest_document(
        &state.db,
        &state.index,
        state.audit_sink.as_ref(),
        state.llm.as_ref(),
        doc,
    )
    .await?;
    Ok(Json(UploadResponse {
        status: "success",
        candidate_id,
    }))
}

/// Reads the `file` field out of a multipart upload and validates it.
async fn document_from_multipart(mut multipart: Multipart) -> Result<AcquiredDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFormat(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .ok_or_else(|| AppError::InvalidFormat("file field has no filename".to_string()))?
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidFormat(format!("could not read upload: {e}")))?;
        return acquire_from_upload(bytes, &filename);
    }
    Err(AppError::InvalidFormat(
        "multipart body is missing a 'file' field".to_string(),
    ))
}
