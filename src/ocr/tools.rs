//! External tool discovery.

pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub const PDFTOTEXT_NOT_FOUND: &str = "pdftotext (install poppler-utils)";
pub const TESSERACT_NOT_FOUND: &str = "tesseract (install tesseract-ocr)";

/// Binaries the extraction pipeline shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["pdftotext", "pdftoppm", "tesseract", "gs"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every required tool, in declaration order.
pub fn check_tools() -> Vec<(String, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}
