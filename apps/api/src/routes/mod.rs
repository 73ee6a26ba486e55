pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", get(handlers::handle_list_operations))
        .route(
            "/api/v1/analyses/:operation",
            post(handlers::handle_run_analysis),
        )
        .route(
            "/api/v1/analyses/:operation/upload",
            post(handlers::handle_run_analysis_upload),
        )
        .route("/api/v1/resumes/extract", post(handlers::handle_extract))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
