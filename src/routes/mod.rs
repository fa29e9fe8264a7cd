//! HTTP routes and router assembly.

pub mod health;
pub mod ocr;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// The body limit sits one MiB above the configured upload ceiling so the
/// gatekeeper's own size check — with its explanatory JSON body — fires
/// before axum's bare 413.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + 1024 * 1024;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/ocr", post(ocr::run_ocr))
        .route("/api/ocr/download", post(ocr::download_ocr))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
