use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // axum's default body cap is below the upload ceiling; size it above the
    // ceiling (plus multipart framing) so our own check is the one that fires.
    let body_limit = state.limits.max_upload_bytes as usize + 64 * 1024;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Voice relay
        .route("/api/upload", post(handlers::upload_audio))
        .route("/api/transcribe", post(handlers::transcribe_audio))
        // Incident-analysis collaborator
        .route("/api/analyze", post(handlers::analyze_incident))
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
