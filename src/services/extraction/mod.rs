//! Document processor: PDF bytes in, per-parameter evidence out.
//!
//! Detection decides whether a PDF needs OCR, a layout backend turns it into
//! lines and tables, and the keyword table narrows those to the evidence the
//! verifier needs.

mod keywords;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use keywords::{
    contains_keyword, extract_parameters, extract_values, filter_layout, keywords_for,
    CONTEXT_RADIUS, PARAMETER_KEYWORDS,
};

use crate::models::{DocumentType, ExtractedDocument, ExtractionMethod};
use crate::ocr::{
    spool_pdf, DocumentLayout, LayoutBackend, LocalLayoutBackend, OcrConfig, OcrError,
    TextExtractor,
};

/// Errors from document processing.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Layout extraction failed: {0}")]
    Layout(#[from] OcrError),
}

/// Extracts quality parameters from laboratory report PDFs.
#[derive(Clone)]
pub struct DocumentProcessor {
    extractor: TextExtractor,
    local: LocalLayoutBackend,
    remote: Option<Arc<dyn LayoutBackend>>,
}

impl DocumentProcessor {
    /// Processor using only local tools.
    pub fn new(ocr_config: OcrConfig, min_chars: usize) -> Self {
        Self {
            extractor: TextExtractor::new().with_min_chars(min_chars),
            local: LocalLayoutBackend::new(ocr_config),
            remote: None,
        }
    }

    /// Prefer a hosted layout backend, keeping local tools as fallback.
    pub fn with_remote(mut self, backend: Arc<dyn LayoutBackend>) -> Self {
        self.remote = Some(backend);
        self
    }

    /// Name of the backend tried first.
    pub fn primary_backend(&self) -> &'static str {
        self.remote
            .as_ref()
            .map(|b| b.name())
            .unwrap_or_else(|| self.local.name())
    }

    /// Whether the PDF looks scanned. Any failure counts as scanned.
    pub async fn is_scanned_pdf(&self, pdf_bytes: &[u8]) -> bool {
        let pdf = match spool_pdf(pdf_bytes) {
            Ok(pdf) => pdf,
            Err(e) => {
                debug!("Could not spool PDF ({}), treating as scanned", e);
                return true;
            }
        };
        let extractor = self.extractor.clone();
        tokio::task::spawn_blocking(move || extractor.is_scanned(pdf.path()))
            .await
            .unwrap_or(true)
    }

    async fn layout(
        &self,
        pdf_bytes: &[u8],
        doc_type: DocumentType,
    ) -> Result<(DocumentLayout, ExtractionMethod), ProcessingError> {
        if let Some(remote) = &self.remote {
            match remote.analyze(pdf_bytes, doc_type).await {
                Ok(layout) => return Ok((layout, remote.method(doc_type))),
                Err(e) => warn!(
                    "{} layout failed ({}), falling back to {}",
                    remote.name(),
                    e,
                    self.local.name()
                ),
            }
        }
        let layout = self.local.analyze(pdf_bytes, doc_type).await?;
        Ok((layout, self.local.method(doc_type)))
    }

    /// Detect, extract, filter and collect parameters for one PDF.
    pub async fn process_pdf(
        &self,
        pdf_bytes: &[u8],
    ) -> Result<ExtractedDocument, ProcessingError> {
        let doc_type = if self.is_scanned_pdf(pdf_bytes).await {
            DocumentType::Scanned
        } else {
            DocumentType::Digital
        };
        info!("Detected {} PDF", doc_type);

        let (layout, method) = self.layout(pdf_bytes, doc_type).await?;
        debug!(
            "Layout: {} lines, {} tables",
            layout.lines.len(),
            layout.tables.len()
        );

        let (text, tables) = filter_layout(&layout);
        let parameters = extract_parameters(&text, &tables);
        info!("Extracted {} parameters", parameters.len());

        Ok(ExtractedDocument {
            text,
            tables,
            parameters,
            doc_type,
            method,
        })
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(OcrConfig::default(), 100)
    }
}
