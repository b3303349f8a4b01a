//! Document verification handlers.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::super::AppState;
use super::error_response;
use crate::services::DocumentVerifier;

/// An uploaded file from a multipart form.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Collect every file sent under `field_name`.
async fn read_uploads(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<Upload>, Response> {
    let mut uploads = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read {}: {}", filename, e),
            )
        })?;
        uploads.push(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if uploads.is_empty() {
        return Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Missing form field: {}", field_name),
        ));
    }
    Ok(uploads)
}

fn load_verifier(state: &AppState) -> Result<DocumentVerifier, Response> {
    state.settings.verifier().map_err(|e| {
        tracing::error!("{}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

fn status_label(compliant: bool) -> &'static str {
    if compliant {
        "passed"
    } else {
        "failed"
    }
}

/// Extract, verify and (when passed) certify one upload.
async fn process_upload(
    state: &AppState,
    verifier: &DocumentVerifier,
    upload: &Upload,
) -> anyhow::Result<serde_json::Value> {
    let doc = state.processor.process_pdf(&upload.bytes).await?;

    let parameter_file = state
        .storage
        .save_parameters(&upload.filename, &doc.parameters)?;

    let report = verifier.verify_document(&doc).await;
    let compliant = report.overall_compliant;

    let mut response = json!({
        "document": upload.filename,
        "status": status_label(compliant),
        "details": report,
        "doc_type": doc.doc_type,
        "processing_info": {
            "parameter_file": parameter_file.display().to_string(),
            "model_info": report.model_info,
            "extraction_method": doc.method,
        },
    });

    if compliant {
        match state.certificates.generate(
            &upload.filename,
            &state.settings.standard_name(),
            &report,
        ) {
            Ok(path) => {
                response["certificate_path"] =
                    json!(path.map(|p| p.display().to_string()));
                response["certificate_generated"] = json!(true);
            }
            Err(e) => {
                tracing::warn!("Certificate for {} failed: {}", upload.filename, e);
                response["certificate_error"] = json!(e.to_string());
                response["certificate_generated"] = json!(false);
            }
        }
    }

    Ok(response)
}

/// Verify uploaded PDFs against the configured standard.
pub async fn verify_document(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let verifier = match load_verifier(&state) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let uploads = match read_uploads(&mut multipart, "files").await {
        Ok(uploads) => uploads,
        Err(response) => return response,
    };

    let mut results = Vec::with_capacity(uploads.len());
    for upload in &uploads {
        tracing::info!("Processing {} ({} bytes)", upload.filename, upload.bytes.len());
        match process_upload(&state, &verifier, upload).await {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::error!("Error processing {}: {}", upload.filename, e);
                results.push(json!({
                    "document": upload.filename,
                    "status": "error",
                    "error": e.to_string(),
                }));
            }
        }
    }

    Json(json!({
        "processed_count": results.len(),
        "results": results,
        "api_info": {
            "hf_token_used": state.settings.has_hf_token(),
            "standard_file": state.settings.standard_file.display().to_string(),
        },
    }))
    .into_response()
}

/// Verify a pre-extracted parameters JSON file.
pub async fn verify_from_json(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let verifier = match load_verifier(&state) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let upload = match read_uploads(&mut multipart, "file").await {
        Ok(mut uploads) => uploads.remove(0),
        Err(response) => return response,
    };

    let text = String::from_utf8_lossy(&upload.bytes);
    match verifier.verify_json(&text).await {
        Ok(report) => Json(json!({
            "document": upload.filename,
            "status": status_label(report.overall_compliant),
            "details": report,
            "source": "json_parameters",
        }))
        .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing JSON file: {}", e),
        ),
    }
}
