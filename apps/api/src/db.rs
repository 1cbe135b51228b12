use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Bootstraps the candidate tables if they do not exist yet.
///
/// Work experiences and raw CV texts cascade on candidate deletion so the
/// compensating delete in the ingestion saga is a single parent delete at
/// the SQL level (the store still deletes children explicitly).
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id          BIGSERIAL PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT,
            phone       TEXT,
            education   TEXT,
            skills      TEXT,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS work_experiences (
            id            BIGSERIAL PRIMARY KEY,
            candidate_id  BIGINT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
            company       TEXT,
            position      TEXT,
            start_date    TEXT,
            end_date      TEXT,
            description   TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_cvs (
            id            BIGSERIAL PRIMARY KEY,
            candidate_id  BIGINT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
            raw_text      TEXT NOT NULL,
            source_path   TEXT,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
