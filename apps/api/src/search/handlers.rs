use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::search::search_candidates;
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct CandidateSearch {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    10
}

/// POST /search_candidates/
pub async fn handle_search_candidates(
    State(state): State<AppState>,
    Json(search): Json<CandidateSearch>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let records =
        search_candidates(&state.db, &state.index, &search.query, search.max_results).await?;
    Ok(Json(records))
}

/// GET /candidates — administrative listing of every stored candidate.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let records = store::get_all_candidates(&state.db).await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults_max_results() {
        let search: CandidateSearch =
            serde_json::from_str(r#"{"query": "backend engineer"}"#).unwrap();
        assert_eq!(search.max_results, 10);
    }

    #[test]
    fn test_search_request_honors_explicit_max_results() {
        let search: CandidateSearch =
            serde_json::from_str(r#"{"query": "python", "max_results": 5}"#).unwrap();
        assert_eq!(search.max_results, 5);
    }
}
