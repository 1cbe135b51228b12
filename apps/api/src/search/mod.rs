//! Similarity search — ranked ids from the embedding index, full records
//! from the relational store, emitted in relevance order.

pub mod handlers;

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{debug, warn};

use crate::embedding::EmbeddingIndex;
use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::store;

/// Searches the embedding index and assembles the full candidate record for
/// each hit, preserving the index's relevance order. Ids known to the index
/// but missing from the store (stale entries) are skipped, not fatal.
/// A query matching nothing yields an empty list.
pub async fn search_candidates(
    pool: &PgPool,
    index: &EmbeddingIndex,
    query: &str,
    max_results: usize,
) -> Result<Vec<CandidateRecord>, AppError> {
    let ranked_ids = index.query(query, max_results).await?;
    debug!("Index returned {} ranked ids for query", ranked_ids.len());
    if ranked_ids.is_empty() {
        return Ok(Vec::new());
    }

    let records = store::get_candidates_by_ids(pool, &ranked_ids).await?;
    Ok(order_by_rank(&ranked_ids, records))
}

/// Re-orders fetched records to match the ranked id sequence. The relational
/// fetch is set-based and loses rank, so this restores it; ranked ids with no
/// matching record are logged and dropped.
fn order_by_rank(ranked_ids: &[i64], records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut by_id: HashMap<i64, CandidateRecord> =
        records.into_iter().map(|r| (r.id, r)).collect();

    let mut ordered = Vec::with_capacity(ranked_ids.len());
    for id in ranked_ids {
        match by_id.remove(id) {
            Some(record) => ordered.push(record),
            None => {
                warn!("Index returned candidate {id} with no relational row, skipping");
            }
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str) -> CandidateRecord {
        CandidateRecord {
            id,
            name: name.to_string(),
            email: None,
            phone: None,
            education: None,
            skills: Vec::new(),
            work_experience: Vec::new(),
        }
    }

    #[test]
    fn test_order_by_rank_restores_relevance_order() {
        // Store returns rows in id order; the ranked sequence differs.
        let records = vec![record(1, "a"), record(2, "b"), record(3, "c")];
        let ordered = order_by_rank(&[3, 1, 2], records);
        let ids: Vec<i64> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_order_by_rank_skips_stale_index_entries() {
        let records = vec![record(1, "a"), record(3, "c")];
        let ordered = order_by_rank(&[3, 99, 1], records);
        let ids: Vec<i64> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_order_by_rank_empty() {
        assert!(order_by_rank(&[], Vec::new()).is_empty());
    }
}
