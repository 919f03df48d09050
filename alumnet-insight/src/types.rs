//! Core data types for the content analysis pipeline.

use serde::{Deserialize, Serialize};

// ============================================================================
// Input Types
// ============================================================================

/// A post submitted for analysis.
#[derive(Debug, Clone, Default)]
pub struct PostContent {
    /// Raw post text.
    pub text: String,
    /// Optional attached image.
    pub image: Option<ImageData>,
}

impl PostContent {
    /// Create a text-only post.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    /// Create a post with an attached image.
    pub fn with_image(text: impl Into<String>, image: ImageData) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
        }
    }
}

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime: String,
}

// ============================================================================
// Result Types
// ============================================================================

/// Sentiment label for a post.
///
/// Hosted models emit a wider label set (`LABEL_0`, `4 stars`, ...); every
/// label is normalized into these three before leaving the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Normalize a hosted-model label into the closed set.
    pub fn from_model_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("pos") || lower == "label_2" || lower.ends_with("5 stars") {
            Self::Positive
        } else if lower.contains("neg") || lower == "label_0" || lower.ends_with("1 star") {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Where an analysis (or parts of it) came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisOrigin {
    /// Every stage was produced by a hosted model.
    Hosted,
    /// Every stage came from the deterministic fallback.
    Fallback,
    /// Some stages degraded to the fallback.
    Mixed,
}

/// A two-line story summary: headline plus supporting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySummary {
    pub title: String,
    pub subtitle: String,
}

impl StorySummary {
    /// Render into the wire convention: `"<title>\n\n<subtitle>"`.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.title, self.subtitle)
    }
}

/// The analysis result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    /// Story summary, formatted as `"<title>\n\n<subtitle>"`.
    pub summary: String,
    /// Normalized sentiment label.
    pub sentiment: Sentiment,
    /// Ordered topic labels, at most 5, never empty.
    pub key_topics: Vec<String>,
    /// Confidence in `[0, 1]`. Model-derived on the hosted path, the
    /// canonical 0.85 on the fallback path.
    pub confidence: f64,
    /// Provenance marker for degraded-but-successful responses.
    pub origin: AnalysisOrigin,
}
