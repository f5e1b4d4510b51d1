//! Classifier adapters.
//!
//! The relevance model (FastText-style language/domain filter, or a heavier
//! transformer scorer) runs behind an HTTP scoring endpoint; this module is
//! only the transport. Scoring semantics live in the model service.

use corpusclean_core::{Classifier, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP adapter for a `POST {"text": ...}` → `{"score": ...}` scoring endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoreResponse {
    score: f64,
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn score(&self, text: &str) -> Result<f64> {
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&ScoreRequest { text })
            .send()
            .await
            .map_err(|e| Error::ClassifierUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ClassifierUnavailable(format!(
                "classifier HTTP {status}"
            )));
        }

        let parsed: ScoreResponse = resp
            .json()
            .await
            .map_err(|e| Error::ClassifierUnavailable(e.to_string()))?;
        if !(0.0..=1.0).contains(&parsed.score) || !parsed.score.is_finite() {
            return Err(Error::ClassifierUnavailable(format!(
                "classifier returned score outside [0,1]: {}",
                parsed.score
            )));
        }
        Ok(parsed.score)
    }
}

/// Constant-score classifier for runs without a model endpoint (and tests).
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    score: f64,
}

impl FixedClassifier {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

#[async_trait::async_trait]
impl Classifier for FixedClassifier {
    async fn score(&self, _text: &str) -> Result<f64> {
        Ok(self.score)
    }
}
