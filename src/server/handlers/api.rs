//! Health and status handlers.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use super::super::AppState;
use crate::ocr::TextExtractor;

fn token_status(state: &AppState) -> &'static str {
    if state.settings.has_hf_token() {
        "available"
    } else {
        "not_available"
    }
}

/// Root health check with configuration summary.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": "Document Verification API is running",
        "status": "healthy",
        "hf_token_status": token_status(&state),
        "standard_file": state.settings.standard_file.display().to_string(),
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Detailed API status.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let tools: BTreeMap<String, bool> = tokio::task::spawn_blocking(TextExtractor::check_tools)
        .await
        .unwrap_or_default()
        .into_iter()
        .collect();

    Json(json!({
        "api_version": "1.0",
        "status": "healthy",
        "huggingface_token": token_status(&state),
        "standard_file_exists": state.settings.standard_file.exists(),
        "directories": state.storage.directory_status(),
        "tools": tools,
        "layout_backend": state.processor.primary_backend(),
    }))
}
