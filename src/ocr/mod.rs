//! OCR and layout extraction module.
//!
//! Extracts text from laboratory reports using:
//! - pdftotext (Poppler) for PDFs with a text layer
//! - Tesseract OCR for scanned PDFs (rendered with pdftoppm)
//! - Azure Document Intelligence when credentials are configured
//!
//! Tables are recovered from layout text by column gaps, or taken from the
//! hosted layout model directly.

mod azure;
mod backend;
mod extractor;
mod layout;
mod pdf_utils;
mod tables;
mod tesseract;
mod tools;

pub use azure::AzureLayoutBackend;
pub use backend::{OcrConfig, OcrError, PageText};
pub use extractor::{ExtractionError, TextExtractor};
pub use layout::{spool_pdf, DocumentLayout, LayoutBackend, LocalLayoutBackend};
pub use pdf_utils::render_pages;
pub use tables::{detect_tables, split_cells};
pub use tesseract::TesseractOcr;
pub use tools::{check_binary, check_tools, REQUIRED_TOOLS};
