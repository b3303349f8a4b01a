//! Hugging Face inference API client.
//!
//! Provides zero-shot classification (used for compliance checks) and
//! extractive question answering (used to build standards from PDFs).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default inference endpoint (model name is appended).
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Zero-shot classification model.
pub const NLI_MODEL: &str = "facebook/bart-large-mnli";

/// Extractive question answering model.
pub const QA_MODEL: &str = "deepset/roberta-base-squad2";

/// Environment variables checked for a token, in priority order.
pub const TOKEN_ENV_VARS: &[&str] = &[
    "HF_API_TOKEN",
    "HUGGINGFACE_API_TOKEN",
    "HF_TOKEN",
    "HUGGINGFACE_TOKEN",
];

/// Find an API token in the environment.
pub fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

/// Errors from the inference API.
#[derive(Debug, Error)]
pub enum HfError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Label not returned by classifier: {0}")]
    MissingLabel(String),
}

/// Scores for each candidate label, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl Classification {
    /// Score assigned to a label.
    pub fn score_for(&self, label: &str) -> Result<f64, HfError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
            .ok_or_else(|| HfError::MissingLabel(label.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

/// The API has answered in two shapes over time.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns { labels: Vec<String>, scores: Vec<f64> },
    Rows(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl ZeroShotResponse {
    fn into_classification(self) -> Classification {
        match self {
            ZeroShotResponse::Columns { labels, scores } => Classification { labels, scores },
            ZeroShotResponse::Rows(rows) => Classification {
                labels: rows.iter().map(|r| r.label.clone()).collect(),
                scores: rows.iter().map(|r| r.score).collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    Single(QaAnswer),
    Many(Vec<QaAnswer>),
}

#[derive(Debug, Deserialize)]
struct QaAnswer {
    #[serde(default)]
    answer: String,
}

impl QaResponse {
    fn into_answer(self) -> String {
        match self {
            QaResponse::Single(a) => a.answer,
            QaResponse::Many(list) => list
                .into_iter()
                .next()
                .map(|a| a.answer)
                .unwrap_or_default(),
        }
    }
}

/// Client for hosted inference.
#[derive(Clone)]
pub struct HfClient {
    token: String,
    base_url: String,
    client: Client,
}

impl HfClient {
    /// Create a client authenticated with `token`.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, HfError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HfError::Connection(e.to_string()))?;
        Ok(Self {
            token: token.into(),
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            client,
        })
    }

    /// Override the inference endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, model)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<R, HfError> {
        let url = self.model_url(model);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| HfError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HfError::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| HfError::Parse(e.to_string()))
    }

    /// Zero-shot classification of `text` against candidate labels.
    pub async fn zero_shot(
        &self,
        text: &str,
        labels: &[String],
        multi_label: bool,
    ) -> Result<Classification, HfError> {
        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
                multi_label,
            },
        };
        let resp: ZeroShotResponse = self.post(NLI_MODEL, &request).await?;
        Ok(resp.into_classification())
    }

    /// Extractive question answering over `context`.
    pub async fn question_answer(&self, question: &str, context: &str) -> Result<String, HfError> {
        let request = QaRequest {
            inputs: QaInputs { question, context },
        };
        let resp: QaResponse = self.post(QA_MODEL, &request).await?;
        Ok(resp.into_answer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shot_column_shape() {
        let json = r#"{"sequence": "x", "labels": ["b", "a"], "scores": [0.7, 0.3]}"#;
        let resp: ZeroShotResponse = serde_json::from_str(json).unwrap();
        let c = resp.into_classification();
        assert_eq!(c.score_for("a").unwrap(), 0.3);
    }

    #[test]
    fn test_zero_shot_row_shape() {
        let json = r#"[{"label": "a", "score": 0.9}, {"label": "b", "score": 0.1}]"#;
        let resp: ZeroShotResponse = serde_json::from_str(json).unwrap();
        let c = resp.into_classification();
        assert_eq!(c.labels, vec!["a", "b"]);
        assert!(matches!(c.score_for("zzz"), Err(HfError::MissingLabel(_))));
    }

    #[test]
    fn test_qa_shapes() {
        let single: QaResponse =
            serde_json::from_str(r#"{"answer": "20%", "score": 0.8, "start": 1, "end": 4}"#)
                .unwrap();
        assert_eq!(single.into_answer(), "20%");

        let many: QaResponse = serde_json::from_str(r#"[{"answer": "40 mg/kg"}]"#).unwrap();
        assert_eq!(many.into_answer(), "40 mg/kg");
    }

    #[test]
    fn test_model_url() {
        let client = HfClient::new("t", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9999/models/");
        assert_eq!(
            client.model_url(NLI_MODEL),
            "http://localhost:9999/models/facebook/bart-large-mnli"
        );
    }
}
