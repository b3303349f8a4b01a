//! PDF helpers built on the Poppler command-line tools.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;
use super::tools::PDFTOPPM_NOT_FOUND;

const PAGE_PREFIX: &str = "page";

/// Render every page of a PDF to PNG, returning images in page order.
pub fn render_pages(
    pdf_path: &Path,
    dpi: u32,
    output_dir: &Path,
) -> Result<Vec<(u32, PathBuf)>, OcrError> {
    let status = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string()])
        .arg(pdf_path)
        .arg(output_dir.join(PAGE_PREFIX))
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            return Err(OcrError::OcrFailed(format!(
                "pdftoppm exited with {}",
                s.code().unwrap_or(-1)
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OcrError::BackendNotAvailable(PDFTOPPM_NOT_FOUND.to_string()))
        }
        Err(e) => return Err(OcrError::Io(e)),
    }

    let pages = rendered_pages(output_dir)?;
    if pages.is_empty() {
        return Err(OcrError::OcrFailed("pdftoppm produced no pages".to_string()));
    }
    Ok(pages)
}

/// Page images in `dir`, sorted by page number.
///
/// pdftoppm zero-pads the page number to the width of the page count, so
/// names sort wrongly as strings past page 9 of a short document.
pub fn rendered_pages(dir: &Path) -> std::io::Result<Vec<(u32, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(page) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(page_number)
        {
            pages.push((page, path));
        }
    }
    pages.sort_by_key(|(page, _)| *page);
    Ok(pages)
}

/// Page number from a pdftoppm file name such as `page-07.png`.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("page-1.png"), Some(1));
        assert_eq!(page_number("page-012.png"), Some(12));
        assert_eq!(page_number("page-01.ppm"), None);
        assert_eq!(page_number("cover.png"), None);
    }

    #[test]
    fn test_rendered_pages_sorted_numerically() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }

        let pages: Vec<u32> = rendered_pages(temp.path())
            .unwrap()
            .into_iter()
            .map(|(page, _)| page)
            .collect();
        assert_eq!(pages, vec![1, 2, 10]);
    }
}
