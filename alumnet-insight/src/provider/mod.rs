//! Hosted inference provider abstraction.
//!
//! Provides a unified interface for the inference tasks the pipeline needs
//! (captioning, summarization, sentiment, zero-shot topics) with consistent
//! error classification across providers.

mod huggingface;
mod openai;
mod resilient;

pub use huggingface::HuggingFaceProvider;
pub use openai::OpenAiProvider;
pub use resilient::ResilientChain;

use crate::types::{ImageData, Sentiment};
use async_trait::async_trait;

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for hosted inference providers.
///
/// A provider implements every task; providers that cannot serve a task
/// return a non-retryable error so the chain falls through cleanly.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Describe an image in one sentence.
    async fn caption(&self, image: &ImageData) -> Result<String, ProviderError>;

    /// Summarize post text into a short paragraph.
    async fn summarize(&self, text: &str) -> Result<String, ProviderError>;

    /// Classify the sentiment of post text.
    async fn sentiment(&self, text: &str) -> Result<SentimentScore, ProviderError>;

    /// Score candidate topic labels against post text.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ProviderError>;
}

/// Inference task, used for error reporting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Caption,
    Summarize,
    Sentiment,
    Classify,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Caption => write!(f, "caption"),
            Self::Summarize => write!(f, "summarize"),
            Self::Sentiment => write!(f, "sentiment"),
            Self::Classify => write!(f, "classify"),
        }
    }
}

/// Error from a provider.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub task: Task,
    pub message: String,
    pub status_code: Option<u16>,
    /// Whether retrying the same provider may succeed (cold model, 429, 5xx).
    pub retryable: bool,
}

impl ProviderError {
    /// Build an error from an HTTP status and response body.
    pub fn from_status(provider: &str, task: Task, status: u16, body: &str) -> Self {
        // HF returns 503 with an estimated_time while a model container warms up
        let retryable = status == 429 || status >= 500;
        Self {
            provider: provider.to_string(),
            task,
            message: format!("API error {}: {}", status, body),
            status_code: Some(status),
            retryable,
        }
    }

    /// Build an error from a transport-level failure (connect, timeout).
    pub fn transport(provider: &str, task: Task, err: &reqwest::Error) -> Self {
        Self {
            provider: provider.to_string(),
            task,
            message: format!("Request failed: {}", err),
            status_code: None,
            retryable: true,
        }
    }

    /// Build an error from a malformed response.
    pub fn malformed(provider: &str, task: Task, detail: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            task,
            message: format!("Malformed response: {}", detail.into()),
            status_code: None,
            retryable: false,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.task, self.message)
    }
}

impl std::error::Error for ProviderError {}

// ============================================================================
// Task Result Types
// ============================================================================

/// Sentiment label plus the model's own score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub sentiment: Sentiment,
    pub score: f64,
}

/// A candidate label with its classification score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}
