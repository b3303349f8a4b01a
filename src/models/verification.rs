//! Verification result models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A number found in text, with its unit and surrounding passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub value: String,
    pub unit: String,
    pub context: String,
}

/// Kind of limit a requirement expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementType {
    Maximum,
    Minimum,
    Range,
    Unknown,
}

/// Outcome for a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterResult {
    pub compliant: bool,
    pub message: String,
    #[serde(default)]
    pub extracted_values: Vec<ExtractedValue>,
    pub standard_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_type: Option<RequirementType>,
}

impl ParameterResult {
    /// A result carrying only a verdict and message.
    pub fn bare(compliant: bool, message: impl Into<String>) -> Self {
        Self {
            compliant,
            message: message.into(),
            extracted_values: Vec::new(),
            standard_value: None,
            requirement_type: None,
        }
    }
}

/// Which classifier produced the verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub using_hf_token: bool,
    pub nli_available: bool,
}

/// Verification outcome for a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub overall_compliant: bool,
    #[serde(default)]
    pub compliance_reason: String,
    pub parameter_results: BTreeMap<String, ParameterResult>,
    pub parameters_checked: usize,
    #[serde(default)]
    pub model_info: ModelInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationReport {
    /// Minimal failed report used when verification itself breaks.
    pub fn failed(error: impl Into<String>, model_info: ModelInfo) -> Self {
        let error = error.into();
        let mut parameter_results = BTreeMap::new();
        parameter_results.insert(
            "error".to_string(),
            ParameterResult::bare(false, error.clone()),
        );
        Self {
            overall_compliant: false,
            compliance_reason: format!("Verification error: {}", error),
            parameter_results,
            parameters_checked: 0,
            model_info,
            error: Some(error),
        }
    }

    /// Number of compliant parameter results.
    pub fn passed_count(&self) -> usize {
        self.parameter_results
            .values()
            .filter(|r| r.compliant)
            .count()
    }
}
