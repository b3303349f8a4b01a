//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.settings.upload_limit;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::api_status))
        // Verification
        .route("/verify_document", post(handlers::verify_document))
        .route("/verify_from_json", post(handlers::verify_from_json))
        // Certificates
        .route("/list_certificates", get(handlers::list_certificates))
        .route(
            "/download_certificate/:filename",
            get(handlers::download_certificate),
        )
        .route("/certificates/:filename", delete(handlers::delete_certificate))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
