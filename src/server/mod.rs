//! HTTP API for document verification.
//!
//! Provides:
//! - Health and status endpoints
//! - PDF upload, extraction, verification and certification
//! - Verification of pre-extracted parameter files
//! - Certificate listing, download and deletion

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::{CertificateGenerator, DocumentProcessor};
use crate::storage::Storage;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub storage: Storage,
    pub processor: DocumentProcessor,
    pub certificates: CertificateGenerator,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: Arc::new(settings.clone()),
            storage: settings.storage(),
            processor: settings.document_processor(),
            certificates: settings.certificate_generator(),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    tracing::info!(
        "Hugging Face token: {}",
        if settings.has_hf_token() {
            "available"
        } else {
            "not found, using heuristic verification"
        }
    );
    tracing::info!(
        "Standard file: {} ({})",
        settings.standard_file.display(),
        if settings.standard_file.exists() {
            "exists"
        } else {
            "missing"
        }
    );

    let state = AppState::new(settings);
    tracing::info!("Layout backend: {}", state.processor.primary_backend());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::Standard;

    const BOUNDARY: &str = "docverify-test-boundary";

    fn setup_test_app(with_standard: bool) -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        // Keep tests offline regardless of the environment.
        settings.hf_token = None;
        settings.ensure_directories().unwrap();

        if with_standard {
            let mut standard = Standard::new();
            standard.insert("moisture_content", "maximum 20%");
            standard.insert("hMF_content", "maximum 40 mg/kg");
            standard.insert("diastase_activity", "minimum 8 Schade units");
            standard.insert("sucrose_content", "not more than 5 g/100g");
            standard.save(&settings.standard_file).unwrap();
        }

        let app = create_router(AppState::new(&settings));
        (app, dir)
    }

    fn multipart_request(uri: &str, field: &str, filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY,
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["hf_token_status"], "not_available");
        assert!(json["standard_file"]
            .as_str()
            .unwrap()
            .ends_with("gso_honey_standard.json"));
    }

    #[tokio::test]
    async fn test_api_status() {
        let (app, _dir) = setup_test_app(true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["api_version"], "1.0");
        assert_eq!(json["standard_file_exists"], true);
        assert_eq!(json["directories"]["certificates"], true);
        assert!(json["tools"]["tesseract"].is_boolean());
    }

    #[tokio::test]
    async fn test_verify_from_json() {
        let (app, _dir) = setup_test_app(true);
        let params = r#"{
            "moisture_content": {"sections": ["moisture 17.2 %"], "raw_values": []},
            "hMF_content": {"sections": ["hmf 12 mg/kg acceptable"], "raw_values": []},
            "diastase_activity": {"sections": ["diastase 9 schade"], "raw_values": []},
            "sucrose_content": {"sections": ["sucrose within limits"], "raw_values": []}
        }"#;

        let response = app
            .oneshot(multipart_request(
                "/verify_from_json",
                "file",
                "params.json",
                params,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["document"], "params.json");
        assert_eq!(json["status"], "passed");
        assert_eq!(json["source"], "json_parameters");
        assert_eq!(json["details"]["parameters_checked"], 4);
    }

    #[tokio::test]
    async fn test_verify_from_json_invalid() {
        let (app, _dir) = setup_test_app(true);

        let response = app
            .oneshot(multipart_request(
                "/verify_from_json",
                "file",
                "params.json",
                "not json",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Error processing JSON file"));
    }

    #[tokio::test]
    async fn test_missing_standard_is_server_error() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(multipart_request(
                "/verify_document",
                "files",
                "report.pdf",
                "%PDF-1.4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Standard file not found"));
    }

    #[tokio::test]
    async fn test_certificate_lifecycle() {
        let (app, dir) = setup_test_app(false);
        let cert = dir.path().join("certificates").join("sample_Certificate_20240101.pdf");
        std::fs::write(&cert, b"%PDF-1.5 test").unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/list_certificates")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["total_count"], 1);
        assert_eq!(
            json["certificates"][0]["name"],
            "sample_Certificate_20240101.pdf"
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/download_certificate/sample_Certificate_20240101.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("sample_Certificate_20240101.pdf"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/certificates/sample_Certificate_20240101.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!cert.exists());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/certificates/sample_Certificate_20240101.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/download_certificate/..%2Fstandards%2Fgso_honey_standard.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
