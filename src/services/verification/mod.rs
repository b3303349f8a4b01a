//! Verification of extracted parameters against a quality standard.
//!
//! Each parameter defined in the standard is classified from its evidence
//! (sections plus table text). The document passes when enough parameters
//! were checked and a large enough share of them comply.

mod classifier;
mod numeric;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use classifier::{ComplianceClassifier, HeuristicClassifier, NliClassifier, Verdict};
pub use numeric::{extract_numeric_values, find_standard_value, numbers, requirement_type};

use super::extraction::{CONTEXT_RADIUS, PARAMETER_KEYWORDS};
use crate::hf::HfClient;
use crate::models::{
    ExtractedDocument, ModelInfo, ParameterData, ParameterResult, Standard, VerificationReport,
};
use crate::utils::context_window;

/// Errors from building a verifier or reading parameters.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Standard file not found: {0}")]
    StandardNotFound(String),

    #[error("Invalid standard file {path}: {message}")]
    InvalidStandard { path: String, message: String },

    #[error("Invalid parameters JSON: {0}")]
    InvalidParameters(#[from] serde_json::Error),
}

/// Pass/fail rules for a whole document.
#[derive(Debug, Clone)]
pub struct VerificationSettings {
    /// Fewer checked parameters than this always fails.
    pub min_parameters: usize,
    /// Share of compliant parameters required to pass.
    pub compliance_threshold: f64,
    /// Parameters left when this runs out are skipped.
    pub time_budget: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            min_parameters: 4,
            compliance_threshold: 0.60,
            time_budget: Duration::from_secs(45),
        }
    }
}

/// Verifies documents against one standard.
#[derive(Clone)]
pub struct DocumentVerifier {
    standard: Standard,
    settings: VerificationSettings,
    classifier: Arc<dyn ComplianceClassifier>,
    fallback: HeuristicClassifier,
    model_info: ModelInfo,
}

impl DocumentVerifier {
    /// Verifier using the heuristic classifier only.
    pub fn new(standard: Standard, settings: VerificationSettings) -> Self {
        Self {
            standard,
            settings,
            classifier: Arc::new(HeuristicClassifier),
            fallback: HeuristicClassifier,
            model_info: ModelInfo::default(),
        }
    }

    /// Load the standard from `path`.
    pub fn from_standard_file(
        path: &Path,
        settings: VerificationSettings,
    ) -> Result<Self, VerificationError> {
        if !path.exists() {
            return Err(VerificationError::StandardNotFound(path.display().to_string()));
        }
        let standard = Standard::load(path).map_err(|e| VerificationError::InvalidStandard {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Loaded standard with {} parameters", standard.len());
        Ok(Self::new(standard, settings))
    }

    /// Classify with hosted NLI, keeping the heuristic for failed calls.
    pub fn with_hf_client(mut self, client: HfClient) -> Self {
        self.classifier = Arc::new(NliClassifier::new(client));
        self.model_info = ModelInfo {
            using_hf_token: true,
            nli_available: true,
        };
        self
    }

    /// Use a custom classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ComplianceClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn standard(&self) -> &Standard {
        &self.standard
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model_info
    }

    async fn verify_parameter(
        &self,
        name: &str,
        data: &ParameterData,
        requirement: &str,
    ) -> ParameterResult {
        if requirement.is_empty() {
            return ParameterResult::bare(false, "Standard requirement not available");
        }

        let evidence = data.combined_text();
        let extracted_values = extract_numeric_values(&evidence);
        let (standard_value, requirement_type) = find_standard_value(requirement).unzip();

        let verdict = match self.classifier.classify(name, &evidence, requirement).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    "{} classifier failed for {} ({}), using fallback",
                    self.classifier.name(),
                    name,
                    e
                );
                self.fallback.verdict(&evidence, requirement)
            }
        };

        ParameterResult {
            compliant: verdict.compliant,
            message: verdict.message,
            extracted_values,
            standard_value,
            requirement_type,
        }
    }

    /// Verify per-parameter evidence against the standard.
    pub async fn verify_parameters(
        &self,
        params: &BTreeMap<String, ParameterData>,
    ) -> VerificationReport {
        let start = Instant::now();
        let mut results = BTreeMap::new();
        let mut checked = 0usize;
        let mut compliant = 0usize;

        for (name, data) in params {
            if start.elapsed() >= self.settings.time_budget {
                warn!("Verification time budget exhausted, returning partial results");
                break;
            }

            let Some(requirement) = self.standard.requirement(name) else {
                results.insert(
                    name.clone(),
                    ParameterResult::bare(
                        true,
                        "Parameter found in document but not defined in standards",
                    ),
                );
                continue;
            };

            let result = self.verify_parameter(name, data, requirement).await;
            debug!("{}: compliant={} ({})", name, result.compliant, result.message);
            checked += 1;
            if result.compliant {
                compliant += 1;
            }
            results.insert(name.clone(), result);
        }

        if checked == 0 {
            results.insert(
                "no_parameters".to_string(),
                ParameterResult::bare(
                    false,
                    "No matching parameters found between document and standard",
                ),
            );
            checked = 1;
        }

        let (overall_compliant, compliance_reason) = if checked < self.settings.min_parameters {
            (
                false,
                format!(
                    "Fewer than {} parameters verified",
                    self.settings.min_parameters
                ),
            )
        } else {
            let ratio = compliant as f64 / checked as f64;
            (
                ratio >= self.settings.compliance_threshold,
                format!(
                    "{} out of {} compliant ({:.1}%)",
                    compliant,
                    checked,
                    ratio * 100.0
                ),
            )
        };
        info!("Verification: {}", compliance_reason);

        VerificationReport {
            overall_compliant,
            compliance_reason,
            parameter_results: results,
            parameters_checked: checked,
            model_info: self.model_info,
            error: None,
        }
    }

    /// Verify a pre-extracted parameters JSON document.
    pub async fn verify_json(&self, json: &str) -> Result<VerificationReport, VerificationError> {
        let params: BTreeMap<String, ParameterData> = serde_json::from_str(json)?;
        Ok(self.verify_parameters(&params).await)
    }

    /// Rebuild evidence from a processed document and verify it.
    pub async fn verify_document(&self, doc: &ExtractedDocument) -> VerificationReport {
        match document_evidence(doc) {
            Ok(params) => self.verify_parameters(&params).await,
            Err(e) => {
                warn!("Document verification failed: {}", e);
                let model_info = ModelInfo {
                    nli_available: false,
                    ..self.model_info
                };
                VerificationReport::failed(e.to_string(), model_info)
            }
        }
    }
}

/// Sections around the first hit of each keyword (original case) plus the
/// text of every table mentioning one.
pub fn document_evidence(
    doc: &ExtractedDocument,
) -> Result<BTreeMap<String, ParameterData>, regex::Error> {
    let mut params: BTreeMap<String, ParameterData> = BTreeMap::new();

    for (param, keywords) in PARAMETER_KEYWORDS {
        let mut sections = Vec::new();
        for keyword in *keywords {
            let pattern = Regex::new(&format!("(?i){}", regex::escape(keyword)))?;
            if let Some(hit) = pattern.find(&doc.text) {
                sections.push(
                    context_window(&doc.text, hit.start(), hit.start(), CONTEXT_RADIUS).to_string(),
                );
            }
        }
        if !sections.is_empty() {
            params.entry(param.to_string()).or_default().sections = sections;
        }
    }

    for table in &doc.tables {
        let table_text = table.to_text();
        let lower = table_text.to_lowercase();
        for (param, keywords) in PARAMETER_KEYWORDS {
            for keyword in *keywords {
                if lower.contains(keyword) {
                    params
                        .entry(param.to_string())
                        .or_default()
                        .raw_values
                        .push(table_text.clone());
                }
            }
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hf::HfError;
    use crate::models::{DocumentType, ExtractionMethod, TableData};
    use async_trait::async_trait;

    fn standard() -> Standard {
        let mut s = Standard::new();
        s.insert("moisture_content", "maximum 20%");
        s.insert("hMF_content", "maximum 40 mg/kg");
        s.insert("diastase_activity", "minimum 8 Schade units");
        s.insert("sucrose_content", "not more than 5 g/100g");
        s.insert("free_acidity", "");
        s
    }

    fn param(section: &str) -> ParameterData {
        ParameterData {
            sections: vec![section.to_string()],
            ..Default::default()
        }
    }

    fn verifier() -> DocumentVerifier {
        DocumentVerifier::new(standard(), VerificationSettings::default())
    }

    struct Failing;

    #[async_trait]
    impl ComplianceClassifier for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn classify(&self, _: &str, _: &str, _: &str) -> Result<Verdict, HfError> {
            Err(HfError::Connection("offline".to_string()))
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl ComplianceClassifier for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn classify(&self, _: &str, _: &str, _: &str) -> Result<Verdict, HfError> {
            tokio::time::sleep(self.0).await;
            Ok(Verdict {
                compliant: true,
                message: "slow verdict".to_string(),
            })
        }
    }

    fn budgeted(budget: Duration) -> DocumentVerifier {
        DocumentVerifier::new(
            standard(),
            VerificationSettings {
                time_budget: budget,
                ..VerificationSettings::default()
            },
        )
    }

    fn four_params() -> BTreeMap<String, ParameterData> {
        let mut params = BTreeMap::new();
        params.insert("diastase_activity".to_string(), param("diastase 9 schade"));
        params.insert("hMF_content".to_string(), param("hmf 12 mg/kg"));
        params.insert("moisture_content".to_string(), param("moisture 17.2 %"));
        params.insert("sucrose_content".to_string(), param("sucrose 2 g/100g"));
        params
    }

    #[tokio::test]
    async fn test_time_budget_returns_partial_results() {
        let report = budgeted(Duration::from_millis(20))
            .with_classifier(Arc::new(Slow(Duration::from_millis(100))))
            .verify_parameters(&four_params())
            .await;

        // The first parameter starts inside the budget, the rest are skipped.
        assert_eq!(report.parameters_checked, 1);
        assert_eq!(report.parameter_results.len(), 1);
        assert_eq!(report.parameter_results["diastase_activity"].message, "slow verdict");
        assert!(!report.overall_compliant);
        assert_eq!(report.compliance_reason, "Fewer than 4 parameters verified");
    }

    #[tokio::test]
    async fn test_exhausted_budget_checks_nothing() {
        let report = budgeted(Duration::ZERO).verify_parameters(&four_params()).await;

        assert_eq!(report.parameters_checked, 1);
        assert_eq!(report.parameter_results.len(), 1);
        assert!(!report.parameter_results["no_parameters"].compliant);
        assert!(!report.overall_compliant);
    }

    #[tokio::test]
    async fn test_all_compliant_passes() {
        let mut params = BTreeMap::new();
        params.insert("moisture_content".to_string(), param("moisture 17.2 %"));
        params.insert("hMF_content".to_string(), param("hmf 12 mg/kg acceptable"));
        params.insert("diastase_activity".to_string(), param("diastase 9 schade"));
        params.insert("sucrose_content".to_string(), param("sucrose within limits"));

        let report = verifier().verify_parameters(&params).await;
        assert!(report.overall_compliant);
        assert_eq!(report.parameters_checked, 4);
        assert_eq!(report.compliance_reason, "4 out of 4 compliant (100.0%)");
        assert_eq!(
            report.parameter_results["hMF_content"].standard_value.as_deref(),
            Some("40 mg/kg")
        );
    }

    #[tokio::test]
    async fn test_threshold_applies() {
        let mut params = BTreeMap::new();
        params.insert("moisture_content".to_string(), param("moisture failed"));
        params.insert("hMF_content".to_string(), param("hmf exceeds"));
        params.insert("diastase_activity".to_string(), param("diastase 9 schade"));
        params.insert("sucrose_content".to_string(), param("sucrose ok"));

        let report = verifier().verify_parameters(&params).await;
        assert!(!report.overall_compliant);
        assert_eq!(report.compliance_reason, "2 out of 4 compliant (50.0%)");
    }

    #[tokio::test]
    async fn test_missing_requirement_and_unknown_parameter() {
        let mut params = BTreeMap::new();
        params.insert("free_acidity".to_string(), param("acidity 20 meq/kg"));
        params.insert("colour".to_string(), param("amber"));

        let report = verifier().verify_parameters(&params).await;
        let acidity = &report.parameter_results["free_acidity"];
        assert!(!acidity.compliant);
        assert_eq!(acidity.message, "Standard requirement not available");

        let colour = &report.parameter_results["colour"];
        assert!(colour.compliant);
        assert_eq!(report.parameters_checked, 1);
        assert_eq!(report.compliance_reason, "Fewer than 4 parameters verified");
    }

    #[tokio::test]
    async fn test_no_matching_parameters() {
        let report = verifier().verify_parameters(&BTreeMap::new()).await;
        assert!(!report.overall_compliant);
        assert_eq!(report.parameters_checked, 1);
        assert!(!report.parameter_results["no_parameters"].compliant);
    }

    #[tokio::test]
    async fn test_classifier_error_uses_fallback() {
        let mut params = BTreeMap::new();
        params.insert("moisture_content".to_string(), param("moisture 20"));
        let report = verifier()
            .with_classifier(Arc::new(Failing))
            .verify_parameters(&params)
            .await;
        assert_eq!(
            report.parameter_results["moisture_content"].message,
            "Fallback: Found matching numerical value"
        );
    }

    #[tokio::test]
    async fn test_verify_json() {
        let json = r#"{"moisture_content": {"contexts": ["moisture 17 %"], "raw_values": []}}"#;
        let report = verifier().verify_json(json).await.unwrap();
        assert!(report.parameter_results.contains_key("moisture_content"));

        assert!(matches!(
            verifier().verify_json("not json").await,
            Err(VerificationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_missing_standard_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = DocumentVerifier::from_standard_file(
            &dir.path().join("missing.json"),
            VerificationSettings::default(),
        );
        assert!(matches!(result, Err(VerificationError::StandardNotFound(_))));
    }

    #[test]
    fn test_document_evidence() {
        let doc = ExtractedDocument {
            text: "Sample A\nMoisture: 17.2\nHMF 12\n".to_string(),
            tables: vec![TableData {
                table_id: "table1".to_string(),
                data: vec![vec!["Sucrose".to_string(), "2 g/100g".to_string()]],
            }],
            parameters: BTreeMap::new(),
            doc_type: DocumentType::Digital,
            method: ExtractionMethod::PdfToText,
        };
        let params = document_evidence(&doc).unwrap();
        assert!(params["moisture_content"].sections[0].contains("Moisture: 17.2"));
        assert!(params["hMF_content"].sections[0].contains("HMF 12"));
        // "sucrose" and "g/100g" both hit the same table.
        assert_eq!(params["sucrose_content"].raw_values.len(), 2);
    }
}
