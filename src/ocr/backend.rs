//! Shared OCR types.

use thiserror::Error;

/// Errors from OCR and layout backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Layout analysis failed: {0}")]
    LayoutFailed(String),

    #[error("Layout analysis timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tesseract settings for scanned reports.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code, e.g. "eng" or "eng+ara".
    pub language: String,
    /// Render resolution for PDF pages.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 300,
        }
    }
}

/// Text recognised on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
    pub elapsed_ms: u64,
}
