//! Tesseract OCR for scanned reports.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;

use super::backend::{OcrConfig, OcrError, PageText};
use super::pdf_utils::render_pages;
use super::tools::TESSERACT_NOT_FOUND;

/// Runs the tesseract binary over rendered PDF pages.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// OCR one image.
    ///
    /// Uses a single-block page layout and keeps inter-word spacing so that
    /// table columns survive as runs of spaces.
    pub fn image_text(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language, "--psm", "6"])
            .args(["-c", "preserve_interword_spaces=1"])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => Err(OcrError::OcrFailed(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    /// Render and OCR every page of a PDF.
    ///
    /// Pages that fail are skipped; the call only fails when no page
    /// produced text.
    pub fn pdf_pages(&self, pdf_path: &Path) -> Result<Vec<PageText>, OcrError> {
        let temp_dir = TempDir::new()?;
        let images = render_pages(pdf_path, self.config.dpi, temp_dir.path())?;
        let total = images.len();

        let mut pages = Vec::with_capacity(total);
        let mut last_error = None;
        for (page, image) in images {
            let start = Instant::now();
            match self.image_text(&image) {
                Ok(text) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    tracing::debug!("OCR page {}/{} in {}ms", page, total, elapsed_ms);
                    pages.push(PageText {
                        page,
                        text,
                        elapsed_ms,
                    });
                }
                Err(e) => {
                    tracing::warn!("OCR failed for page {}: {}", page, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if pages.is_empty() => Err(e),
            _ => Ok(pages),
        }
    }
}
