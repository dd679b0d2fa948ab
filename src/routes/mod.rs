//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Drawings arrive as base64 data URLs, so allow bodies well above axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router with:
/// - API under `/api/v1/...`
/// - Static SPA from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Accounts
        .route("/api/v1/register", post(http::http_register))
        .route("/api/v1/login", post(http::http_login))
        .route("/api/v1/logout", post(http::http_logout))
        // Practice
        .route("/api/v1/dashboard", get(http::http_dashboard))
        .route("/api/v1/practice/:skill_id", post(http::http_practice))
        .route("/api/v1/next_question", get(http::http_next_question))
        .route("/api/v1/check_answer", post(http::http_check_answer))
        // AI
        .route("/api/v1/ask_tutor", post(http::http_ask_tutor))
        .route("/api/v1/analyze_handwriting", post(http::http_analyze_handwriting))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
