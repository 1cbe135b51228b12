pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ingest::handlers as ingest_handlers;
use crate::search::handlers as search_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload_cv/", post(ingest_handlers::handle_upload_cv))
        .route(
            "/upload_cv_from_drive/",
            post(ingest_handlers::handle_upload_cv_from_drive),
        )
        .route(
            "/upload_cv_ollama/",
            post(ingest_handlers::handle_upload_cv_ollama),
        )
        .route(
            "/search_candidates/",
            post(search_handlers::handle_search_candidates),
        )
        .route("/candidates", get(search_handlers::handle_list_candidates))
        .with_state(state)
}
