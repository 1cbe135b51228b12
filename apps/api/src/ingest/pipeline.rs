//! Ingestion orchestrator — sequences extraction, structured extraction,
//! relational persistence, and embedding indexing for one acquired document.
//!
//! The relational write is one transaction; the embedding upsert is a second,
//! independent system. The two are reconciled as a saga: if the upsert fails
//! after the relational create committed, the create is compensated with a
//! transactional delete so the two stores stay consistent.

use sqlx::PgPool;
use tracing::{error, info};

use crate::embedding::{document_text, EmbeddingIndex};
use crate::errors::AppError;
use crate::ingest::acquire::AcquiredDocument;
use crate::ingest::extract::{extract_text, RawTextSink};
use crate::llm_client::{extract_candidate, TextCompletionBackend};
use crate::store;

/// Runs the full pipeline for an already-acquired document. Returns the
/// assigned candidate id. Failure at any stage aborts the ingestion and
/// leaves no candidate rows visible.
pub async fn ingest_document(
    pool: &PgPool,
    index: &EmbeddingIndex,
    sink: &dyn RawTextSink,
    backend: &dyn TextCompletionBackend,
    doc: AcquiredDocument,
) -> Result<i64, AppError> {
    let raw_text = extract_text(&doc.bytes)?;
    sink.record(&doc.filename, &raw_text);

    let candidate_data = extract_candidate(&raw_text, backend).await?;

    let candidate_id = store::create_candidate(pool, &candidate_data, &raw_text, &doc.filename).await?;

    let document = document_text(&candidate_data);
    if let Err(index_err) = index.upsert(candidate_id, &document).await {
        // Compensate: the relational create committed but the index write
        // did not, so roll the candidate back before reporting the failure.
        error!(
            "Index upsert failed for candidate {candidate_id}, rolling back relational rows"
        );
        if let Err(delete_err) = store::delete_candidate(pool, candidate_id).await {
            error!(
                "Compensating delete for candidate {candidate_id} also failed: {delete_err}"
            );
        }
        return Err(index_err);
    }

    info!(
        backend = backend.name(),
        "Ingested {} as candidate {candidate_id}", doc.filename
    );
    Ok(candidate_id)
}
