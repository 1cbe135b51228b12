//! Candidate store — relational persistence for candidates, their work
//! experiences, and the raw CV audit text.
//!
//! Every multi-row write runs inside its own transaction acquired from the
//! pool, so concurrent requests never share a session and a failed ingestion
//! leaves no partial rows behind.

use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::{
    CandidateData, CandidateRecord, CandidateRow, WorkExperienceRow,
};

/// Inserts the candidate, all work-experience rows, and the raw CV row as one
/// atomic unit. Returns the database-assigned candidate id.
///
/// Insert order matters: children reference the parent id assigned by the
/// first insert. Any failure rolls the whole transaction back.
pub async fn create_candidate(
    pool: &PgPool,
    data: &CandidateData,
    raw_text: &str,
    source_path: &str,
) -> Result<i64, AppError> {
    let skills_json = serde_json::to_string(&data.skills)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("skills serialization failed: {e}")))?;

    let mut tx = pool.begin().await?;

    let candidate_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO candidates (name, email, phone, education, skills)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.education)
    .bind(&skills_json)
    .fetch_one(&mut *tx)
    .await?;

    for exp in &data.work_experience {
        sqlx::query(
            r#"
            INSERT INTO work_experiences
                (candidate_id, company, position, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(candidate_id)
        .bind(&exp.company)
        .bind(&exp.position)
        .bind(&exp.start_date)
        .bind(&exp.end_date)
        .bind(&exp.description)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO raw_cvs (candidate_id, raw_text, source_path)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(candidate_id)
    .bind(raw_text)
    .bind(source_path)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Created candidate {candidate_id} with {} work experiences",
        data.work_experience.len()
    );
    Ok(candidate_id)
}

/// Deletes a candidate and its children in one transaction.
///
/// Used as the compensating action when the embedding upsert fails after the
/// relational create committed. Children are deleted explicitly rather than
/// relying on the FK cascade alone.
pub async fn delete_candidate(pool: &PgPool, candidate_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM work_experiences WHERE candidate_id = $1")
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM raw_cvs WHERE candidate_id = $1")
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Deleted candidate {candidate_id} and children");
    Ok(())
}

/// Fetches the full records for the given ids, with work-experience children.
/// Returned in the store's natural order; callers needing relevance order
/// re-sort against their own id ranking.
pub async fn get_candidates_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<Vec<CandidateRecord>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let candidates: Vec<CandidateRow> =
        sqlx::query_as("SELECT * FROM candidates WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    assemble_records(pool, candidates).await
}

/// Administrative listing of every candidate with children.
pub async fn get_all_candidates(pool: &PgPool) -> Result<Vec<CandidateRecord>, AppError> {
    let candidates: Vec<CandidateRow> =
        sqlx::query_as("SELECT * FROM candidates ORDER BY id")
            .fetch_all(pool)
            .await?;

    assemble_records(pool, candidates).await
}

async fn assemble_records(
    pool: &PgPool,
    candidates: Vec<CandidateRow>,
) -> Result<Vec<CandidateRecord>, AppError> {
    let mut records = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let experiences: Vec<WorkExperienceRow> = sqlx::query_as(
            "SELECT * FROM work_experiences WHERE candidate_id = $1 ORDER BY id",
        )
        .bind(candidate.id)
        .fetch_all(pool)
        .await?;
        records.push(CandidateRecord::from_rows(candidate, experiences));
    }
    Ok(records)
}
