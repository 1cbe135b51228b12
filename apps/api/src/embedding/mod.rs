//! Embedding index — derives one embedding document per candidate and keeps
//! it in a Qdrant collection keyed by the candidate id.
//!
//! The embedding model is reached over an OpenAI-compatible `/embeddings`
//! endpoint, which covers both hosted providers and a local Ollama server.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::candidate::CandidateData;

const COLLECTION: &str = "candidate_embeddings";
const EMBED_TIMEOUT_SECS: u64 = 30;
const QDRANT_TIMEOUT_SECS: u64 = 30;

/// Builds the embedding document for a candidate: skills joined by spaces,
/// then all experience descriptions joined by spaces.
///
/// A candidate with no skills and no descriptions yields an empty document;
/// that is accepted and embedded as-is, never rejected.
pub fn document_text(data: &CandidateData) -> String {
    let skills_text = data.skills.join(" ");
    let work_desc = data
        .work_experience
        .iter()
        .filter_map(|e| e.description.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{skills_text} {work_desc}").trim().to_string()
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible embeddings endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(EMBED_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model,
        }
    }

    /// Embeds one text. Empty input is a valid request.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Index(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Index(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("unreadable embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| AppError::Index("embedding response contained no vectors".to_string()))
    }
}

/// Qdrant-backed vector index over candidate embedding documents.
/// One point per candidate; the point id is the candidate id, so re-indexing
/// the same candidate replaces rather than duplicates.
#[derive(Clone)]
pub struct EmbeddingIndex {
    client: Client,
    endpoint: String,
    vector_size: usize,
    embedder: EmbeddingClient,
}

impl EmbeddingIndex {
    pub fn new(qdrant_url: &str, vector_size: usize, embedder: EmbeddingClient) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(QDRANT_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: qdrant_url.trim_end_matches('/').to_string(),
            vector_size,
            embedder,
        }
    }

    /// Creates the collection with cosine distance if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<(), AppError> {
        let response = self
            .client
            .put(format!("{}/collections/{}", self.endpoint, COLLECTION))
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("qdrant unreachable: {e}")))?;

        let status = response.status();
        // 409 means the collection already exists; everything else non-2xx is fatal.
        if !status.is_success() && status.as_u16() != 409 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Index(format!(
                "collection setup returned {status}: {body}"
            )));
        }

        info!("Qdrant collection '{COLLECTION}' ready (dim {})", self.vector_size);
        Ok(())
    }

    /// Embeds `document` and upserts it keyed by the candidate id.
    pub async fn upsert(&self, candidate_id: i64, document: &str) -> Result<(), AppError> {
        let vector = self.embedder.embed(document).await?;
        if vector.len() != self.vector_size {
            return Err(AppError::Index(format!(
                "embedding dimension {} != configured {}",
                vector.len(),
                self.vector_size
            )));
        }

        let response = self
            .client
            .put(format!(
                "{}/collections/{}/points?wait=true",
                self.endpoint, COLLECTION
            ))
            .json(&json!({
                "points": [{
                    "id": candidate_id,
                    "vector": vector,
                    "payload": {
                        "candidate_id": candidate_id,
                        "document": document,
                    },
                }]
            }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("qdrant upsert failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Index(format!(
                "qdrant upsert returned {status}: {body}"
            )));
        }

        debug!("Upserted embedding for candidate {candidate_id}");
        Ok(())
    }

    /// Returns up to `max_results` candidate ids, best match first.
    pub async fn query(&self, query_text: &str, max_results: usize) -> Result<Vec<i64>, AppError> {
        let vector = self.embedder.embed(query_text).await?;

        let response = self
            .client
            .post(format!(
                "{}/collections/{}/points/search",
                self.endpoint, COLLECTION
            ))
            .json(&json!({
                "vector": vector,
                "limit": max_results,
                "with_payload": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("qdrant search failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Index(format!(
                "qdrant search returned {status}: {body}"
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("unreadable qdrant response: {e}")))?;

        Ok(candidate_ids_from_hits(&parsed))
    }
}

/// Pulls ranked candidate ids out of a Qdrant search response body.
/// Hits without a usable integer `candidate_id` payload are skipped with a
/// warning rather than failing the whole query.
fn candidate_ids_from_hits(body: &Value) -> Vec<i64> {
    let hits = body
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut ids = Vec::with_capacity(hits.len());
    for hit in &hits {
        match hit.pointer("/payload/candidate_id").and_then(Value::as_i64) {
            Some(id) => ids.push(id),
            None => {
                warn!("Skipping index hit with malformed candidate_id payload: {hit}");
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::ExperienceData;
    use serde_json::json;

    fn candidate(skills: &[&str], descriptions: &[&str]) -> CandidateData {
        CandidateData {
            name: "Test".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            work_experience: descriptions
                .iter()
                .map(|d| ExperienceData {
                    description: Some(d.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_document_text_joins_skills_then_descriptions() {
        let data = candidate(&["Python", "Django"], &["Built APIs", "Ran migrations"]);
        assert_eq!(
            document_text(&data),
            "Python Django Built APIs Ran migrations"
        );
    }

    #[test]
    fn test_document_text_skips_missing_descriptions() {
        let mut data = candidate(&["Rust"], &["Wrote services"]);
        data.work_experience.push(ExperienceData::default());
        assert_eq!(document_text(&data), "Rust Wrote services");
    }

    #[test]
    fn test_document_text_empty_candidate_is_empty_string() {
        let data = candidate(&[], &[]);
        assert_eq!(document_text(&data), "");
    }

    #[test]
    fn test_candidate_ids_preserve_hit_order() {
        let body = json!({
            "result": [
                {"id": 3, "score": 0.9, "payload": {"candidate_id": 3}},
                {"id": 1, "score": 0.7, "payload": {"candidate_id": 1}},
                {"id": 2, "score": 0.5, "payload": {"candidate_id": 2}},
            ]
        });
        assert_eq!(candidate_ids_from_hits(&body), vec![3, 1, 2]);
    }

    #[test]
    fn test_candidate_ids_skip_malformed_payloads() {
        let body = json!({
            "result": [
                {"id": 3, "payload": {"candidate_id": 3}},
                {"id": 9, "payload": {"candidate_id": "not-a-number"}},
                {"id": 8, "payload": {}},
                {"id": 1, "payload": {"candidate_id": 1}},
            ]
        });
        assert_eq!(candidate_ids_from_hits(&body), vec![3, 1]);
    }

    #[test]
    fn test_candidate_ids_empty_result() {
        assert!(candidate_ids_from_hits(&json!({"result": []})).is_empty());
        assert!(candidate_ids_from_hits(&json!({})).is_empty());
    }
}
