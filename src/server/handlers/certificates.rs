//! Certificate listing, download and deletion.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::super::AppState;
use super::error_response;
use crate::services::CertificateError;

fn not_found(filename: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Certificate not found: {}", filename),
    )
}

/// List all generated certificates.
pub async fn list_certificates(State(state): State<AppState>) -> impl IntoResponse {
    let certificates = state.certificates.list().unwrap_or_else(|e| {
        tracing::error!("Error listing certificates: {}", e);
        Vec::new()
    });

    Json(json!({
        "total_count": certificates.len(),
        "certificates": certificates,
    }))
}

/// Download a certificate as a PDF attachment.
pub async fn download_certificate(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    let path = match state.certificates.resolve(&filename) {
        Ok(path) => path,
        Err(_) => return not_found(&filename),
    };

    let content = match tokio::fs::read(&path).await {
        Ok(c) => c,
        Err(_) => return not_found(&filename),
    };

    let mime = mime_guess::from_path(&path)
        .first_or(mime_guess::mime::APPLICATION_PDF)
        .to_string();
    let disposition = format!("attachment; filename=\"{}\"", filename);

    (
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response()
}

/// Delete a certificate.
pub async fn delete_certificate(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.certificates.delete(&filename) {
        Ok(()) => Json(json!({
            "message": format!("Certificate {} deleted successfully", filename),
        }))
        .into_response(),
        Err(CertificateError::NotFound(_) | CertificateError::InvalidName(_)) => {
            not_found(&filename)
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to delete certificate: {}", e),
        ),
    }
}
