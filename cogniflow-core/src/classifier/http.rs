//! HTTP classification backend
//!
//! POSTs `{"text": ...}` to a configured endpoint and expects
//! `{"category": "...", "confidence": 0.0..1.0}` back.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Classification, Classifier};
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::types::Category;

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    category: String,
    confidence: f32,
}

/// Classifier backed by a remote HTTP service
pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl HttpClassifier {
    /// Create a client from configuration
    ///
    /// Returns `Ok(None)` when no endpoint is configured.
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };
        Self::new(endpoint, Duration::from_millis(config.timeout_ms)).map(Some)
    }

    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "classifier.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Client timeouts keep their own kind so callers can keep prior results.
    fn transport_error(&self, context: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout_ms)
        } else {
            Error::Classifier(format!("{context}: {e}"))
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, text: &str) -> Result<Classification> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| self.transport_error("HTTP request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Classifier(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error("failed to parse response", e))?;

        Ok(Classification {
            category: Category::parse(&body.category),
            confidence: body.confidence,
        })
    }
}
