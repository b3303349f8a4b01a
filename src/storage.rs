//! Working directories under the data directory.
//!
//! Layout:
//! `{data_dir}/standards/`, `{data_dir}/uploads/`,
//! `{data_dir}/extracted_data/`, `{data_dir}/certificates/`

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::ParameterData;
use crate::utils::{file_stem, sanitize_filename};

pub const STANDARDS_DIR: &str = "standards";
pub const UPLOADS_DIR: &str = "uploads";
pub const EXTRACTED_DIR: &str = "extracted_data";
pub const CERTIFICATES_DIR: &str = "certificates";

const ALL_DIRS: [&str; 4] = [STANDARDS_DIR, UPLOADS_DIR, EXTRACTED_DIR, CERTIFICATES_DIR];

/// Paths of the working directories.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn standards_dir(&self) -> PathBuf {
        self.root.join(STANDARDS_DIR)
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join(EXTRACTED_DIR)
    }

    pub fn certificates_dir(&self) -> PathBuf {
        self.root.join(CERTIFICATES_DIR)
    }

    /// Create every working directory.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in ALL_DIRS {
            let path = self.root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", path.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Whether each working directory exists.
    pub fn directory_status(&self) -> BTreeMap<&'static str, bool> {
        ALL_DIRS
            .iter()
            .map(|dir| (*dir, self.root.join(dir).is_dir()))
            .collect()
    }

    /// Where the extracted parameters of an upload are written.
    pub fn parameters_path(&self, upload_name: &str) -> PathBuf {
        self.extracted_dir().join(format!(
            "{}_parameters.json",
            sanitize_filename(file_stem(upload_name))
        ))
    }

    /// Write extracted parameters as pretty JSON, returning the path.
    pub fn save_parameters(
        &self,
        upload_name: &str,
        parameters: &BTreeMap<String, ParameterData>,
    ) -> std::io::Result<PathBuf> {
        let path = self.parameters_path(upload_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(parameters)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        tracing::debug!("Saved parameters to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dirs_and_status() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data"));
        assert!(storage.directory_status().values().all(|exists| !exists));

        storage.ensure_dirs().unwrap();
        let status = storage.directory_status();
        assert_eq!(status.len(), 4);
        assert!(status.values().all(|exists| *exists));
    }

    #[test]
    fn test_parameters_path_uses_sanitized_stem() {
        let storage = Storage::new("/data");
        assert_eq!(
            storage.parameters_path("Lab Report?.pdf"),
            PathBuf::from("/data/extracted_data/Lab Report_parameters.json")
        );
    }

    #[test]
    fn test_save_parameters() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        let mut params = BTreeMap::new();
        params.insert(
            "moisture_content".to_string(),
            ParameterData {
                sections: vec!["moisture 17 %".to_string()],
                ..Default::default()
            },
        );

        let path = storage.save_parameters("report.pdf", &params).unwrap();
        let saved: BTreeMap<String, ParameterData> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved, params);
    }
}
