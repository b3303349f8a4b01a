//! Text extraction from PDFs using pdftotext.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use super::tools::PDFTOTEXT_NOT_FOUND;

/// Stdout of a finished tool invocation, or the matching error.
fn command_stdout(
    result: std::io::Result<std::process::Output>,
    not_found: &str,
    context: &str,
) -> Result<String, ExtractionError> {
    let output = result.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractionError::ToolNotFound(not_found.to_string()),
        _ => ExtractionError::Io(e),
    })?;
    if !output.status.success() {
        return Err(ExtractionError::ExtractionFailed(format!(
            "{}: {}",
            context,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Layout-preserving pdftotext over one page or the whole file.
fn pdftotext(file_path: &Path, page: Option<u32>) -> Result<String, ExtractionError> {
    let mut cmd = Command::new("pdftotext");
    cmd.args(["-layout", "-enc", "UTF-8"]);
    if let Some(page) = page {
        let page = page.to_string();
        cmd.args(["-f", &page, "-l", &page]);
    }
    let output = cmd.arg(file_path).arg("-").output();

    let context = match page {
        Some(page) => format!("pdftotext failed on page {}", page),
        None => "pdftotext failed".to_string(),
    };
    command_stdout(output, PDFTOTEXT_NOT_FOUND, &context)
}

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text extractor for PDFs with a text layer.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    /// Minimum characters on the first page to treat a PDF as born-digital.
    min_chars_first_page: usize,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            min_chars_first_page: 100,
        }
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scanned-document threshold.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars_first_page = min_chars;
        self
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars_first_page
    }

    /// Whether a PDF looks scanned: its first page yields fewer than the
    /// threshold of trimmed characters. Any failure counts as scanned.
    pub fn is_scanned(&self, file_path: &Path) -> bool {
        match self.first_page_text(file_path) {
            Ok(text) => text.trim().chars().count() < self.min_chars_first_page,
            Err(e) => {
                tracing::debug!("First page text unavailable ({}), treating as scanned", e);
                true
            }
        }
    }

    /// Text layer of page 1.
    pub fn first_page_text(&self, file_path: &Path) -> Result<String, ExtractionError> {
        self.page_text(file_path, 1)
    }

    /// Text layer of the whole PDF.
    pub fn pdf_text(&self, file_path: &Path) -> Result<String, ExtractionError> {
        pdftotext(file_path, None)
    }

    /// Text layer of a single page.
    pub fn page_text(&self, file_path: &Path, page: u32) -> Result<String, ExtractionError> {
        pdftotext(file_path, Some(page))
    }

    /// Availability of the external tools extraction relies on.
    pub fn check_tools() -> Vec<(String, bool)> {
        super::tools::check_tools()
    }
}
