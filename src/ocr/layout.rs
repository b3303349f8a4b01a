//! Layout analysis: turning a PDF into text lines and tables.
//!
//! Two backends exist:
//! - `LocalLayoutBackend` shells out to Poppler and Tesseract
//! - `AzureLayoutBackend` (see `azure.rs`) calls a hosted layout model
//!
//! The document processor prefers the hosted backend when it is configured
//! and falls back to the local one on any error.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::backend::{OcrConfig, OcrError};
use super::extractor::TextExtractor;
use super::tables::detect_tables;
use super::tesseract::TesseractOcr;
use crate::models::{DocumentType, ExtractionMethod};

/// Lines and tables recovered from a document, in reading order.
#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    pub lines: Vec<String>,
    pub tables: Vec<Vec<Vec<String>>>,
}

impl DocumentLayout {
    /// Build a layout from layout-preserving plain text.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(|l| l.to_string())
                .collect(),
            tables: detect_tables(text),
        }
    }
}

/// A source of document layout.
#[async_trait]
pub trait LayoutBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// How text produced by this backend for `doc_type` was obtained.
    fn method(&self, doc_type: DocumentType) -> ExtractionMethod;

    /// Analyse a PDF held in memory.
    async fn analyze(
        &self,
        pdf_bytes: &[u8],
        doc_type: DocumentType,
    ) -> Result<DocumentLayout, OcrError>;
}

/// Write PDF bytes to a temp file the command-line tools can read.
pub fn spool_pdf(pdf_bytes: &[u8]) -> Result<NamedTempFile, OcrError> {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    file.write_all(pdf_bytes)?;
    file.flush()?;
    Ok(file)
}

/// Layout via pdftotext (digital) or Tesseract (scanned).
#[derive(Debug, Clone, Default)]
pub struct LocalLayoutBackend {
    ocr_config: OcrConfig,
}

impl LocalLayoutBackend {
    pub fn new(ocr_config: OcrConfig) -> Self {
        Self { ocr_config }
    }

    fn analyze_blocking(
        ocr_config: OcrConfig,
        pdf: NamedTempFile,
        doc_type: DocumentType,
    ) -> Result<DocumentLayout, OcrError> {
        let path = pdf.path();
        match doc_type {
            DocumentType::Digital => {
                let text = TextExtractor::new()
                    .pdf_text(path)
                    .map_err(|e| OcrError::LayoutFailed(e.to_string()))?;
                Ok(DocumentLayout::from_text(&text))
            }
            DocumentType::Scanned => {
                let pages = TesseractOcr::new(ocr_config).pdf_pages(path)?;
                let mut layout = DocumentLayout::default();
                for page in pages {
                    let page_layout = DocumentLayout::from_text(&page.text);
                    layout.lines.extend(page_layout.lines);
                    layout.tables.extend(page_layout.tables);
                }
                Ok(layout)
            }
        }
    }
}

#[async_trait]
impl LayoutBackend for LocalLayoutBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn method(&self, doc_type: DocumentType) -> ExtractionMethod {
        match doc_type {
            DocumentType::Digital => ExtractionMethod::PdfToText,
            DocumentType::Scanned => ExtractionMethod::TesseractOcr,
        }
    }

    async fn analyze(
        &self,
        pdf_bytes: &[u8],
        doc_type: DocumentType,
    ) -> Result<DocumentLayout, OcrError> {
        let pdf = spool_pdf(pdf_bytes)?;
        let ocr_config = self.ocr_config.clone();
        tokio::task::spawn_blocking(move || Self::analyze_blocking(ocr_config, pdf, doc_type))
            .await
            .map_err(|e| OcrError::LayoutFailed(format!("layout task panicked: {}", e)))?
    }
}
