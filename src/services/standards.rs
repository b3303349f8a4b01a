//! Building a quality standard from a standard document.
//!
//! The document text is read with pdftotext, then each parameter is answered
//! by extractive question answering over the whole text.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::hf::HfClient;
use crate::models::Standard;
use crate::ocr::{ExtractionError, TextExtractor};

/// Standard families with a question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardKind {
    #[default]
    Honey,
}

impl std::str::FromStr for StandardKind {
    type Err = StandardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "honey" => Ok(Self::Honey),
            other => Err(StandardsError::UnknownKind(other.to_string())),
        }
    }
}

const HONEY_QUESTIONS: &[(&str, &str)] = &[
    (
        "moisture_content",
        "What is the maximum allowed moisture content for honey?",
    ),
    (
        "hMF_content",
        "What is the maximum allowed hydroxymethylfurfural (HMF) content?",
    ),
    (
        "diastase_activity",
        "What is the minimum diastase activity required?",
    ),
    (
        "sucrose_content",
        "What is the maximum allowed sucrose content?",
    ),
    ("free_acidity", "What is the maximum allowed free acidity?"),
    (
        "electrical_conductivity",
        "What are the requirements for electrical conductivity?",
    ),
    (
        "insoluble_solids",
        "What are the limits for water insoluble solids?",
    ),
    (
        "glucose_fructose",
        "What are the requirements for total glucose and fructose content?",
    ),
];

impl StandardKind {
    /// Parameter name and question pairs.
    pub fn questions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Honey => HONEY_QUESTIONS,
        }
    }
}

#[derive(Debug, Error)]
pub enum StandardsError {
    #[error("Unknown standard type: {0}")]
    UnknownKind(String),

    #[error("No text could be read from {0}")]
    EmptyDocument(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asks one question per parameter of a standard document.
pub struct StandardsExtractor {
    client: HfClient,
    extractor: TextExtractor,
}

impl StandardsExtractor {
    pub fn new(client: HfClient) -> Self {
        Self {
            client,
            extractor: TextExtractor::new(),
        }
    }

    /// Answer every question of `kind` over `text`. Failed calls leave an
    /// empty requirement.
    pub async fn extract_elements(&self, text: &str, kind: StandardKind) -> Standard {
        let mut standard = Standard::new();
        for (parameter, question) in kind.questions() {
            let answer = match self.client.question_answer(question, text).await {
                Ok(answer) => answer.trim().to_string(),
                Err(e) => {
                    warn!("Question for {} failed: {}", parameter, e);
                    String::new()
                }
            };
            standard.insert(*parameter, answer);
        }
        standard
    }

    /// Read a standard PDF and build its requirement table.
    pub async fn process_document(
        &self,
        pdf_path: &Path,
        kind: StandardKind,
    ) -> Result<Standard, StandardsError> {
        let extractor = self.extractor.clone();
        let path = pdf_path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.pdf_text(&path))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))??;

        if text.trim().is_empty() {
            return Err(StandardsError::EmptyDocument(pdf_path.display().to_string()));
        }
        info!(
            "Read {} characters from {}",
            text.len(),
            pdf_path.display()
        );

        Ok(self.extract_elements(&text, kind).await)
    }

    /// Process `pdf_path` and write the standard to `output`.
    pub async fn process_to_file(
        &self,
        pdf_path: &Path,
        output: &Path,
        kind: StandardKind,
    ) -> Result<Standard, StandardsError> {
        let standard = self.process_document(pdf_path, kind).await?;
        standard.save(output)?;
        info!("Standard written to {}", output.display());
        Ok(standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::extraction::PARAMETER_KEYWORDS;
    use std::time::Duration;

    #[test]
    fn test_questions_cover_every_parameter() {
        let questions = StandardKind::Honey.questions();
        assert_eq!(questions.len(), PARAMETER_KEYWORDS.len());
        for (param, _) in PARAMETER_KEYWORDS {
            assert!(questions.iter().any(|(p, _)| p == param), "{}", param);
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Honey".parse::<StandardKind>().unwrap(), StandardKind::Honey);
        assert!("olive oil".parse::<StandardKind>().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_api_yields_empty_answers() {
        let client = HfClient::new("token", Duration::from_millis(200))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let standard = StandardsExtractor::new(client)
            .extract_elements("Moisture not more than 20%", StandardKind::Honey)
            .await;
        assert_eq!(standard.len(), 8);
        assert_eq!(standard.requirement("moisture_content"), Some(""));
    }
}
