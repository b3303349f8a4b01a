//! Azure Document Intelligence layout backend.
//!
//! Submits the PDF to the `prebuilt-layout` model, then polls the returned
//! `Operation-Location` until the analysis succeeds or fails.
//! Requires `AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT` and
//! `AZURE_DOCUMENT_INTELLIGENCE_KEY`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::backend::OcrError;
use super::layout::{DocumentLayout, LayoutBackend};
use crate::models::{DocumentType, ExtractionMethod};

const API_VERSION: &str = "2024-11-30";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Azure layout model backend.
pub struct AzureLayoutBackend {
    endpoint: String,
    key: String,
    client: Client,
    poll_interval: Duration,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    analyze_result: Option<AnalyzeResult>,
    error: Option<AzureError>,
}

#[derive(Debug, Deserialize)]
struct AzureError {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<AzurePage>,
    #[serde(default)]
    tables: Vec<AzureTable>,
}

#[derive(Debug, Deserialize)]
struct AzurePage {
    #[serde(default)]
    lines: Vec<AzureLine>,
}

#[derive(Debug, Deserialize)]
struct AzureLine {
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureTable {
    row_count: usize,
    column_count: usize,
    #[serde(default)]
    cells: Vec<AzureCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCell {
    row_index: usize,
    column_index: usize,
    #[serde(default)]
    content: String,
}

impl AzureTable {
    /// Rebuild the row/column grid from positioned cells.
    fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = vec![vec![String::new(); self.column_count]; self.row_count];
        for cell in &self.cells {
            if let Some(slot) = grid
                .get_mut(cell.row_index)
                .and_then(|row| row.get_mut(cell.column_index))
            {
                *slot = cell.content.clone();
            }
        }
        grid
    }
}

impl AnalyzeResult {
    fn into_layout(self) -> DocumentLayout {
        DocumentLayout {
            lines: self
                .pages
                .into_iter()
                .flat_map(|p| p.lines)
                .map(|l| l.content)
                .collect(),
            tables: self.tables.iter().map(|t| t.to_grid()).collect(),
        }
    }
}

impl AzureLayoutBackend {
    /// Create a backend for the given resource endpoint and key.
    pub fn new(endpoint: &str, key: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| OcrError::LayoutFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            poll_interval: Duration::from_secs(1),
            timeout,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/prebuilt-layout:analyze?api-version={}",
            self.endpoint, API_VERSION
        )
    }

    async fn submit(&self, pdf_bytes: &[u8]) -> Result<String, OcrError> {
        let body = serde_json::json!({
            "base64Source": base64::engine::general_purpose::STANDARD.encode(pdf_bytes),
        });

        let resp = self
            .client
            .post(self.analyze_url())
            .header(KEY_HEADER, &self.key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::LayoutFailed(format!("Azure request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(OcrError::LayoutFailed(format!(
                "Azure returned {}: {}",
                status, text
            )));
        }

        resp.headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                OcrError::LayoutFailed("Azure response missing Operation-Location".to_string())
            })
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, OcrError> {
        let start = Instant::now();
        loop {
            let resp = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.key)
                .send()
                .await
                .map_err(|e| OcrError::LayoutFailed(format!("Azure poll failed: {}", e)))?;

            let operation: AnalyzeOperation = resp
                .json()
                .await
                .map_err(|e| OcrError::LayoutFailed(format!("Invalid Azure response: {}", e)))?;

            match operation.status.as_str() {
                "succeeded" => return Ok(operation.analyze_result.unwrap_or_default()),
                "failed" | "canceled" => {
                    let message = operation
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| operation.status.clone());
                    return Err(OcrError::LayoutFailed(message));
                }
                other => debug!("Azure analysis {}", other),
            }

            if start.elapsed() >= self.timeout {
                return Err(OcrError::Timeout(self.timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl LayoutBackend for AzureLayoutBackend {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn method(&self, _doc_type: DocumentType) -> ExtractionMethod {
        ExtractionMethod::LayoutService
    }

    async fn analyze(
        &self,
        pdf_bytes: &[u8],
        _doc_type: DocumentType,
    ) -> Result<DocumentLayout, OcrError> {
        // The layout model OCRs scanned pages itself, so both kinds go up whole.
        let operation_url = self.submit(pdf_bytes).await?;
        let result = self.poll(&operation_url).await?;
        Ok(result.into_layout())
    }
}
