//! Compliance classifiers.

use async_trait::async_trait;

use super::numeric::numbers;
use crate::hf::{HfClient, HfError};

const COMPLIANCE_KEYWORDS: &[&str] = &[
    "compliant",
    "meets",
    "standard",
    "acceptable",
    "within",
    "pass",
    "passed",
];

const NON_COMPLIANCE_KEYWORDS: &[&str] = &[
    "non-compliant",
    "fails",
    "exceed",
    "below",
    "above limit",
    "fail",
    "failed",
];

/// A compliance decision for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub compliant: bool,
    pub message: String,
}

impl Verdict {
    fn new(compliant: bool, message: impl Into<String>) -> Self {
        Self {
            compliant,
            message: message.into(),
        }
    }
}

/// Decides whether evidence for a parameter satisfies its requirement.
#[async_trait]
pub trait ComplianceClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(
        &self,
        parameter: &str,
        evidence: &str,
        requirement: &str,
    ) -> Result<Verdict, HfError>;
}

/// Zero-shot natural language inference over the hosted API.
pub struct NliClassifier {
    client: HfClient,
}

impl NliClassifier {
    pub fn new(client: HfClient) -> Self {
        Self { client }
    }

    fn labels(parameter: &str) -> [String; 2] {
        [
            format!("This honey complies with the {} standard", parameter),
            format!("This honey does not comply with the {} standard", parameter),
        ]
    }
}

#[async_trait]
impl ComplianceClassifier for NliClassifier {
    fn name(&self) -> &'static str {
        "nli"
    }

    async fn classify(
        &self,
        parameter: &str,
        evidence: &str,
        _requirement: &str,
    ) -> Result<Verdict, HfError> {
        let labels = Self::labels(parameter);
        let classification = self.client.zero_shot(evidence, &labels, false).await?;
        let score = classification.score_for(&labels[0])?;
        Ok(Verdict::new(
            score > 0.5,
            format!("NLI Confidence: {:.2} (using HF token)", score),
        ))
    }
}

/// Keyword and number matching used when no model is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    /// Synchronous form of [`ComplianceClassifier::classify`].
    pub fn verdict(&self, evidence: &str, requirement: &str) -> Verdict {
        let evidence = evidence.to_lowercase();
        let requirement = requirement.to_lowercase();
        let evidence_numbers = numbers(&evidence);
        let standard_numbers = numbers(&requirement);

        if standard_numbers.iter().any(|n| evidence.contains(n)) {
            return Verdict::new(true, "Fallback: Found matching numerical value");
        }
        if COMPLIANCE_KEYWORDS.iter().any(|k| evidence.contains(k)) {
            return Verdict::new(true, "Fallback: Found compliance indicator");
        }
        if NON_COMPLIANCE_KEYWORDS.iter().any(|k| evidence.contains(k)) {
            return Verdict::new(false, "Fallback: Found non-compliance indicator");
        }

        if let (Some(found), Some(limit)) = (evidence_numbers.first(), standard_numbers.first()) {
            if let (Ok(found), Ok(limit)) = (found.parse::<f64>(), limit.parse::<f64>()) {
                if limit != 0.0 && ((found - limit) / limit).abs() < 0.1 {
                    return Verdict::new(true, "Fallback: Values are within acceptable range");
                }
            }
        }

        Verdict::new(
            true,
            "Fallback: Unable to verify definitively, assuming compliant",
        )
    }
}

#[async_trait]
impl ComplianceClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn classify(
        &self,
        _parameter: &str,
        evidence: &str,
        requirement: &str,
    ) -> Result<Verdict, HfError> {
        Ok(self.verdict(evidence, requirement))
    }
}
