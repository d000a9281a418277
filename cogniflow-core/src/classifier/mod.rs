//! Classifier adapter
//!
//! Wraps an external text classification capability. The adapter owns the
//! policy around it: minimum text length, input truncation, the confidence
//! threshold for review, and a hard timeout so a hung backend degrades to
//! "unavailable" instead of stalling tab processing.

mod http;

pub use http::HttpClassifier;

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::types::Category;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A category guess with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub confidence: f32,
}

/// Text classification backend.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Whether the backend is loaded and can answer
    fn is_loaded(&self) -> bool {
        true
    }

    /// Classify page text
    async fn classify(&self, text: &str) -> Result<Classification>;
}

/// Policy wrapper around an optional [`Classifier`].
#[derive(Clone)]
pub struct ClassifierAdapter {
    backend: Option<Arc<dyn Classifier>>,
    config: ClassifierConfig,
}

impl ClassifierAdapter {
    pub fn new(backend: Arc<dyn Classifier>, config: ClassifierConfig) -> Self {
        Self {
            backend: Some(backend),
            config,
        }
    }

    /// Adapter with no backend; every call reports unavailable.
    pub fn unavailable(config: ClassifierConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_loaded())
    }

    /// Whether the text is long enough to be worth classifying
    pub fn has_sufficient_text(&self, text: &str) -> bool {
        text.chars().count() > self.config.min_text_chars
    }

    /// Whether a result is too uncertain to accept without review
    pub fn needs_review(&self, classification: &Classification) -> bool {
        classification.confidence < self.config.review_threshold
    }

    /// Classify text with the backend.
    ///
    /// Fails with `ClassifierUnavailable` when no backend is loaded and with
    /// `Timeout` when the backend does not answer within the configured bound.
    pub async fn classify(&self, text: &str) -> Result<Classification> {
        let backend = match &self.backend {
            Some(backend) if backend.is_loaded() => backend,
            _ => return Err(Error::ClassifierUnavailable),
        };

        let input = truncate_chars(text, self.config.max_input_chars);
        let timeout_ms = self.config.timeout_ms;

        match tokio::time::timeout(Duration::from_millis(timeout_ms), backend.classify(input)).await
        {
            Ok(Ok(mut classification)) => {
                classification.confidence = normalize_confidence(classification.confidence);
                tracing::debug!(
                    backend = backend.name(),
                    category = %classification.category,
                    confidence = classification.confidence,
                    "Classified page text"
                );
                Ok(classification)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(backend = backend.name(), timeout_ms, "Classifier timed out");
                Err(Error::Timeout(timeout_ms))
            }
        }
    }
}

/// Confidence in `0.0..=1.0`; NaN or infinite scores count as no confidence.
fn normalize_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Longest prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
