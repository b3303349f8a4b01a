//! Quality certificates for compliant documents.
//!
//! Certificates are single-page A4 PDFs written with `lopdf` using the
//! standard Helvetica faces, so no font files are needed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CertificateInfo, VerificationReport};
use crate::utils::{is_plain_filename, sanitize_filename};

/// Default issuing authority printed on certificates.
pub const DEFAULT_ISSUER: &str = "Fujairah Research Center";

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MM: f32 = 72.0 / 25.4;

const GOLD: [f32; 3] = [218.0 / 255.0, 165.0 / 255.0, 32.0 / 255.0];
const DARK_BLUE: [f32; 3] = [25.0 / 255.0, 25.0 / 255.0, 112.0 / 255.0];
const GRAY: [f32; 3] = [100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0];
const GREEN: [f32; 3] = [0.0, 128.0 / 255.0, 0.0];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// Errors from certificate storage and rendering.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Certificate not found: {0}")]
    NotFound(String),

    #[error("Invalid certificate name: {0}")]
    InvalidName(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
            Face::Italic => "F3",
        }
    }
}

/// Lays out centred lines top to bottom, tracking the cursor in millimetres
/// from the top edge.
struct PageWriter {
    ops: Vec<Operation>,
    y_mm: f32,
}

impl PageWriter {
    fn new(top_mm: f32) -> Self {
        Self {
            ops: Vec::new(),
            y_mm: top_mm,
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y_mm += mm;
    }

    fn centered(&mut self, text: &str, face: Face, size: f32, color: [f32; 3], height_mm: f32) {
        let width = text_width(text, face, size);
        let x = ((PAGE_WIDTH - width) / 2.0).max(0.0);
        // Baseline sits roughly in the middle of the cell.
        let baseline = PAGE_HEIGHT - (self.y_mm + height_mm / 2.0) * MM - size * 0.35;

        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "rg",
                color.iter().map(|c| Object::Real(*c)).collect(),
            ),
            Operation::new(
                "Tf",
                vec![Object::Name(face.resource().into()), Object::Real(size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
            Operation::new("Tj", vec![Object::string_literal(latin1(text))]),
            Operation::new("ET", vec![]),
        ]);
        self.y_mm += height_mm;
    }
}

/// Approximate Helvetica advance widths, in points.
fn text_width(text: &str, face: Face, size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | '\'' | '|' => 0.278,
            'f' | 't' | 'r' | 'I' | '/' | '-' | '(' | ')' | '"' => 0.333,
            'm' | 'M' | 'W' => 0.833,
            'w' => 0.722,
            c if c.is_ascii_uppercase() => 0.667,
            _ => 0.556,
        })
        .sum();
    let bold = match face {
        Face::Bold => 1.05,
        _ => 1.0,
    };
    em * size * bold
}

/// Encode for the WinAnsi fonts; unmappable characters become `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Writes and manages certificate PDFs in one directory.
#[derive(Debug, Clone)]
pub struct CertificateGenerator {
    output_dir: PathBuf,
    issuer: String,
}

impl CertificateGenerator {
    pub fn new(output_dir: impl Into<PathBuf>, issuer: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            issuer: issuer.into(),
        }
    }

    /// File name for a certificate issued today.
    pub fn certificate_filename(document_name: &str, date: DateTime<Local>) -> String {
        format!(
            "{}_Certificate_{}.pdf",
            sanitize_filename(&document_name.replace(' ', "_")),
            date.format("%Y%m%d")
        )
    }

    /// Write a certificate for a compliant report.
    ///
    /// Returns `None` when the report did not pass.
    pub fn generate(
        &self,
        document_name: &str,
        standard_name: &str,
        report: &VerificationReport,
    ) -> Result<Option<PathBuf>, CertificateError> {
        if !report.overall_compliant {
            return Ok(None);
        }

        let now = Local::now();
        let certificate_id = format!(
            "CERT-{}",
            uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let date = now.format("%B %d, %Y").to_string();
        let passed = report.passed_count();
        let total = report.parameter_results.len();

        let mut page = PageWriter::new(30.0);
        page.centered("CERTIFICATE OF QUALITY", Face::Bold, 28.0, GOLD, 15.0);
        page.gap(8.0);
        page.centered("This is to certify that", Face::Regular, 14.0, DARK_BLUE, 10.0);
        page.gap(3.0);
        page.centered(&format!("\"{}\"", document_name), Face::Bold, 18.0, BLACK, 12.0);
        page.gap(8.0);
        page.centered("HAS SUCCESSFULLY PASSED", Face::Regular, 14.0, GREEN, 10.0);
        page.centered("ALL QUALITY VERIFICATION STANDARDS", Face::Regular, 14.0, GREEN, 10.0);
        page.gap(12.0);
        page.centered(
            &format!("Standards Applied: {}", standard_name),
            Face::Regular,
            12.0,
            BLACK,
            8.0,
        );
        page.gap(8.0);
        page.centered(
            &format!("Parameters Verified: {}/{} PASSED", passed, total),
            Face::Bold,
            12.0,
            GREEN,
            8.0,
        );
        page.gap(15.0);
        for line in [
            format!("Certificate ID: {}", certificate_id),
            format!("Issue Date: {}", date),
            format!("Valid From: {}", date),
            "Status: COMPLIANT".to_string(),
        ] {
            page.centered(&line, Face::Regular, 11.0, GRAY, 6.0);
        }
        page.gap(15.0);
        page.centered("Authorized by:", Face::Regular, 11.0, BLACK, 6.0);
        page.gap(8.0);
        page.centered(&self.issuer, Face::Bold, 11.0, BLACK, 6.0);
        page.centered(
            "This certificate confirms compliance with specified quality standards.",
            Face::Italic,
            8.0,
            GRAY,
            5.0,
        );

        let bytes = render_pdf(page.ops)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(Self::certificate_filename(document_name, now));
        std::fs::write(&path, bytes)?;
        info!("Certificate {} written to {}", certificate_id, path.display());

        Ok(Some(path))
    }

    /// Certificates on disk, sorted by name.
    pub fn list(&self) -> Result<Vec<CertificateInfo>, CertificateError> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }

        let mut certificates = Vec::new();
        for entry in std::fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".pdf") {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping {}: {}", name, e);
                    continue;
                }
            };
            let created = metadata.created().or_else(|_| metadata.modified())?;
            certificates.push(CertificateInfo {
                name,
                created_at: DateTime::<Local>::from(created).to_rfc3339(),
                size_bytes: metadata.len(),
            });
        }

        certificates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(certificates)
    }

    /// Path of an existing certificate. Names that could escape the
    /// certificate directory are rejected.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, CertificateError> {
        if !is_plain_filename(name) || Path::new(name).is_absolute() {
            return Err(CertificateError::InvalidName(name.to_string()));
        }
        let path = self.output_dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(CertificateError::NotFound(name.to_string()))
        }
    }

    pub fn delete(&self, name: &str) -> Result<(), CertificateError> {
        let path = self.resolve(name)?;
        std::fs::remove_file(&path)?;
        info!("Deleted certificate {}", name);
        Ok(())
    }
}

fn render_pdf(operations: Vec<Operation>) -> Result<Vec<u8>, CertificateError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |base: &str| {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(base.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        }
    };
    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let italic_id = doc.add_object(font("Helvetica-Oblique"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
            "F3" => italic_id,
        },
    });

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelInfo, ParameterResult};
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn report(compliant: bool) -> VerificationReport {
        let mut parameter_results = BTreeMap::new();
        parameter_results.insert("moisture_content".to_string(), ParameterResult::bare(true, "ok"));
        parameter_results.insert("hMF_content".to_string(), ParameterResult::bare(false, "high"));
        VerificationReport {
            overall_compliant: compliant,
            compliance_reason: String::new(),
            parameter_results,
            parameters_checked: 2,
            model_info: ModelInfo::default(),
            error: None,
        }
    }

    #[test]
    fn test_certificate_filename() {
        let date = Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(
            CertificateGenerator::certificate_filename("Laura Honey 4.pdf", date),
            "Laura_Honey_4.pdf_Certificate_20240305.pdf"
        );
    }

    #[test]
    fn test_generate_list_delete() {
        let dir = TempDir::new().unwrap();
        let generator = CertificateGenerator::new(dir.path(), DEFAULT_ISSUER);

        assert!(generator
            .generate("sample.pdf", "gso_honey_standard", &report(false))
            .unwrap()
            .is_none());

        let path = generator
            .generate("sample.pdf", "gso_honey_standard", &report(true))
            .unwrap()
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);

        let listed = generator.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].name.starts_with("sample.pdf_Certificate_"));
        assert!(listed[0].size_bytes > 0);

        generator.delete(&listed[0].name).unwrap();
        assert!(generator.list().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let generator = CertificateGenerator::new(dir.path().join("certs"), DEFAULT_ISSUER);
        assert!(matches!(
            generator.resolve("../secret.pdf"),
            Err(CertificateError::InvalidName(_))
        ));
        assert!(matches!(
            generator.resolve("missing.pdf"),
            Err(CertificateError::NotFound(_))
        ));
        assert!(generator.list().unwrap().is_empty());
    }

    #[test]
    fn test_latin1_and_width() {
        assert_eq!(latin1("Café €"), vec![b'C', b'a', b'f', 0xE9, b' ', b'?']);
        assert!(text_width("WIDE", Face::Bold, 12.0) > text_width("wide", Face::Regular, 12.0));
    }
}
