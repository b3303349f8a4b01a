//! Filename helpers for user-supplied names.

/// Sanitize a filename for safe filesystem storage.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Trim and limit length
    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        "document".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

/// File stem of an uploaded filename (`report.final.pdf` -> `report.final`).
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Whether a requested filename refers to a plain entry inside one directory.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("lab/report?.pdf"), "lab_report_.pdf");
        assert_eq!(sanitize_filename("  "), "document");
        assert_eq!(sanitize_filename(".."), "document");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), 100);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("report.final.pdf"), "report.final");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_is_plain_filename() {
        assert!(is_plain_filename("Honey_Certificate_20240101.pdf"));
        assert!(!is_plain_filename("../secret.pdf"));
        assert!(!is_plain_filename("dir/file.pdf"));
        assert!(!is_plain_filename(""));
    }
}
