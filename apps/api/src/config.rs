use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub qdrant_url: String,
    pub gemini_api_key: String,
    pub ollama_url: String,
    pub drive_download_url: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    /// Optional append-only file for raw extracted CV text. Unset disables
    /// the file sink; extraction is then only summarized in the logs.
    pub audit_log_path: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            qdrant_url: require_env("QDRANT_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            ollama_url: std::env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            drive_download_url: std::env::var("DRIVE_DOWNLOAD_URL")
                .unwrap_or_else(|_| "https://drive.google.com/uc".to_string()),
            embedding_url: require_env("EMBEDDING_URL")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            embedding_dim: std::env::var("EMBEDDING_DIM")
                .unwrap_or_else(|_| "768".to_string())
                .parse::<usize>()
                .context("EMBEDDING_DIM must be a positive integer")?,
            audit_log_path: std::env::var("AUDIT_LOG_PATH").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
