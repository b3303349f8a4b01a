//! HTTP request handlers for the web server.

mod api;
mod certificates;
mod verify;

// Re-export handlers for use by the router
pub use api::{api_status, health, root};
pub use certificates::{delete_certificate, download_certificate, list_certificates};
pub use verify::{verify_document, verify_from_json};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// JSON `{"error": ...}` body with a status code.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
