//! Configuration management for docverify using the prefer crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hf::{self, HfClient};
use crate::ocr::{AzureLayoutBackend, OcrConfig};
use crate::services::{
    CertificateGenerator, DocumentProcessor, DocumentVerifier, VerificationError,
    VerificationSettings, DEFAULT_ISSUER,
};
use crate::storage::Storage;

/// Standard file used when none is configured.
pub const DEFAULT_STANDARD_FILENAME: &str = "gso_honey_standard.json";

/// Default upload limit for the HTTP API (50 MiB).
pub const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

pub const AZURE_ENDPOINT_ENV: &str = "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT";
pub const AZURE_KEY_ENV: &str = "AZURE_DOCUMENT_INTELLIGENCE_KEY";

/// Errors reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },
}

/// Standard file inside the standards directory of `data_dir`.
fn default_standard_file(data_dir: &Path) -> PathBuf {
    Storage::new(data_dir)
        .standards_dir()
        .join(DEFAULT_STANDARD_FILENAME)
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory holding the working directories.
    pub data_dir: PathBuf,
    /// Standard JSON used for verification.
    pub standard_file: PathBuf,
    /// Tesseract language code.
    pub ocr_language: String,
    /// Render resolution for OCR.
    pub ocr_dpi: u32,
    /// First-page characters below which a PDF counts as scanned.
    pub scanned_min_chars: usize,
    pub min_parameters: usize,
    pub compliance_threshold: f64,
    /// Verification time budget in seconds.
    pub verification_timeout: u64,
    /// Issuing authority printed on certificates.
    pub certificate_issuer: String,
    /// Maximum request body for uploads, in bytes.
    pub upload_limit: usize,
    pub azure_endpoint: Option<String>,
    pub azure_key: Option<String>,
    /// Layout analysis polling budget in seconds.
    pub azure_timeout: u64,
    /// Hugging Face API token. Never logged.
    pub hf_token: Option<String>,
    pub hf_inference_url: String,
    /// Inference request timeout in seconds.
    pub hf_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_data_dir(PathBuf::from("."))
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            standard_file: default_standard_file(&data_dir),
            data_dir,
            ocr_language: "eng".to_string(),
            ocr_dpi: 300,
            scanned_min_chars: 100,
            min_parameters: 4,
            compliance_threshold: 0.60,
            verification_timeout: 45,
            certificate_issuer: DEFAULT_ISSUER.to_string(),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            azure_endpoint: None,
            azure_key: None,
            azure_timeout: 120,
            hf_token: None,
            hf_inference_url: hf::DEFAULT_INFERENCE_URL.to_string(),
            hf_timeout: 30,
        }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(&self.data_dir)
    }

    /// Ensure all working directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        self.storage().ensure_dirs()
    }

    /// Standard name as printed on certificates (file stem).
    pub fn standard_name(&self) -> String {
        self.standard_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "standard".to_string())
    }

    pub fn has_hf_token(&self) -> bool {
        self.hf_token.is_some()
    }

    pub fn has_azure(&self) -> bool {
        self.azure_endpoint.is_some() && self.azure_key.is_some()
    }

    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            language: self.ocr_language.clone(),
            dpi: self.ocr_dpi,
        }
    }

    pub fn verification_settings(&self) -> VerificationSettings {
        VerificationSettings {
            min_parameters: self.min_parameters,
            compliance_threshold: self.compliance_threshold,
            time_budget: Duration::from_secs(self.verification_timeout),
        }
    }

    /// Inference client, when a token is configured.
    pub fn hf_client(&self) -> Option<HfClient> {
        let token = self.hf_token.as_ref()?;
        match HfClient::new(token, Duration::from_secs(self.hf_timeout)) {
            Ok(client) => Some(client.with_base_url(&self.hf_inference_url)),
            Err(e) => {
                tracing::warn!("Inference client unavailable: {}", e);
                None
            }
        }
    }

    /// Document processor, using the hosted layout service when configured.
    pub fn document_processor(&self) -> DocumentProcessor {
        let processor = DocumentProcessor::new(self.ocr_config(), self.scanned_min_chars);
        let (Some(endpoint), Some(key)) = (&self.azure_endpoint, &self.azure_key) else {
            return processor;
        };
        match AzureLayoutBackend::new(endpoint, key, Duration::from_secs(self.azure_timeout)) {
            Ok(backend) => processor.with_remote(Arc::new(backend)),
            Err(e) => {
                tracing::warn!("Layout service unavailable, using local tools: {}", e);
                processor
            }
        }
    }

    /// Verifier for the configured standard.
    pub fn verifier(&self) -> Result<DocumentVerifier, VerificationError> {
        let verifier = DocumentVerifier::from_standard_file(
            &self.standard_file,
            self.verification_settings(),
        )?;
        Ok(match self.hf_client() {
            Some(client) => verifier.with_hf_client(client),
            None => verifier,
        })
    }

    pub fn certificate_generator(&self) -> CertificateGenerator {
        CertificateGenerator::new(self.storage().certificates_dir(), &self.certificate_issuer)
    }
}

/// `[ocr]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_threshold: Option<usize>,
}

/// `[verification]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_parameters: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[azure]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[huggingface]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuggingFaceSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Standard JSON file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_issuer: Option<String>,
    /// Upload limit in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_limit_mb: Option<usize>,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub verification: VerificationSection,
    #[serde(default)]
    pub azure: AzureSection,
    #[serde(default)]
    pub huggingface: HuggingFaceSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    pub async fn load() -> Self {
        match prefer::load("docverify").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// TOML, YAML or JSON depending on the extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            let data_dir = self.resolve_path(data_dir, base_dir);
            *settings = Settings {
                standard_file: default_standard_file(&data_dir),
                data_dir,
                ..settings.clone()
            };
        }
        if let Some(ref standard_file) = self.standard_file {
            settings.standard_file = self.resolve_path(standard_file, base_dir);
        }
        if let Some(ref issuer) = self.certificate_issuer {
            settings.certificate_issuer = issuer.clone();
        }
        if let Some(mb) = self.upload_limit_mb {
            settings.upload_limit = mb * 1024 * 1024;
        }

        if let Some(ref language) = self.ocr.language {
            settings.ocr_language = language.clone();
        }
        if let Some(dpi) = self.ocr.dpi {
            settings.ocr_dpi = dpi;
        }
        if let Some(threshold) = self.ocr.scanned_threshold {
            settings.scanned_min_chars = threshold;
        }

        if let Some(min) = self.verification.min_parameters {
            settings.min_parameters = min;
        }
        if let Some(threshold) = self.verification.compliance_threshold {
            settings.compliance_threshold = threshold;
        }
        if let Some(timeout) = self.verification.timeout_secs {
            settings.verification_timeout = timeout;
        }

        if let Some(ref endpoint) = self.azure.endpoint {
            settings.azure_endpoint = Some(endpoint.clone());
        }
        if let Some(ref key) = self.azure.key {
            settings.azure_key = Some(key.clone());
        }
        if let Some(timeout) = self.azure.timeout_secs {
            settings.azure_timeout = timeout;
        }

        if let Some(ref token) = self.huggingface.token {
            settings.hf_token = Some(token.clone());
        }
        if let Some(ref url) = self.huggingface.inference_url {
            settings.hf_inference_url = url.clone();
        }
        if let Some(timeout) = self.huggingface.timeout_secs {
            settings.hf_timeout = timeout;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory (--data flag).
    pub data: Option<PathBuf>,
}

/// Look for a config file inside the data directory.
fn find_config_in_data_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];
    let basenames = ["docverify", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Priority 2: Config inside the data dir
    if let Some(data_dir) = data_dir {
        if let Some(config_path) = find_config_in_data_dir(data_dir) {
            tracing::debug!("Found config in data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Config::default()
                });
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Environment variables take precedence over every file source.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(endpoint) = env_value(AZURE_ENDPOINT_ENV) {
        tracing::debug!("Using {} from environment", AZURE_ENDPOINT_ENV);
        settings.azure_endpoint = Some(endpoint);
    }
    if let Some(key) = env_value(AZURE_KEY_ENV) {
        settings.azure_key = Some(key);
    }
    if let Some(token) = hf::token_from_env() {
        tracing::debug!("Hugging Face token found (length: {})", token.len());
        settings.hf_token = Some(token);
    }
    if let Some(standard) = env_value("DOCVERIFY_STANDARD_FILE") {
        settings.standard_file = PathBuf::from(shellexpand::tilde(&standard).as_ref());
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let data_dir_override = options.data.as_deref().map(absolute);

    let config = load_file_config(&options, data_dir_override.as_deref()).await;

    let mut settings = Settings::default();

    // Determine base directory for resolving relative paths
    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --data override takes precedence for data_dir
    if let Some(data_dir) = data_dir_override {
        let standard_file = if config.standard_file.is_some() {
            settings.standard_file.clone()
        } else {
            default_standard_file(&data_dir)
        };
        settings.data_dir = data_dir;
        settings.standard_file = standard_file;
    }

    apply_env_overrides(&mut settings);

    (settings, config)
}
