//! Hugging Face Inference API provider.
//!
//! First-tier provider for every pipeline task. Each task maps to a hosted
//! model configured in [`HuggingFaceConfig`]; the response shape differs per
//! task pipeline (summarization, text-classification, zero-shot, captioning).

use super::{InferenceProvider, LabelScore, ProviderError, SentimentScore, Task};
use crate::types::{ImageData, Sentiment};
use alumnet_common::config::HuggingFaceConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// Hugging Face Inference API provider.
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    api_base: String,
    summarization_model: String,
    sentiment_model: String,
    zero_shot_model: String,
    caption_model: String,
}

impl HuggingFaceProvider {
    /// Create a provider from config plus an optional API token.
    ///
    /// The Inference API accepts anonymous calls at a reduced rate limit,
    /// so the token is optional.
    pub fn new(config: &HuggingFaceConfig, api_token: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            if !token.is_empty() {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token))
                        .unwrap_or_else(|_| HeaderValue::from_static("")),
                );
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            summarization_model: config.summarization_model.clone(),
            sentiment_model: config.sentiment_model.clone(),
            zero_shot_model: config.zero_shot_model.clone(),
            caption_model: config.caption_model.clone(),
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.api_base, model)
    }

    /// POST a JSON body to a model endpoint and decode the response as `T`.
    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        task: Task,
        model: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.model_url(model))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::transport("huggingface", task, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                "huggingface",
                task,
                status.as_u16(),
                &body,
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::malformed("huggingface", task, e.to_string()))
    }
}

#[async_trait]
impl InferenceProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn caption(&self, image: &ImageData) -> Result<String, ProviderError> {
        // Captioning models take raw image bytes, not JSON
        let response = self
            .client
            .post(self.model_url(&self.caption_model))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_str(&image.mime)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
            )
            .body(image.bytes.clone())
            .send()
            .await
            .map_err(|e| ProviderError::transport("huggingface", Task::Caption, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                "huggingface",
                Task::Caption,
                status.as_u16(),
                &body,
            ));
        }

        let captions: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed("huggingface", Task::Caption, e.to_string()))?;

        captions
            .into_iter()
            .next()
            .map(|c| c.generated_text)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::malformed("huggingface", Task::Caption, "empty caption list")
            })
    }

    async fn summarize(&self, text: &str) -> Result<String, ProviderError> {
        let body = SummarizationRequest {
            inputs: text,
            parameters: SummarizationParameters {
                max_length: 80,
                min_length: 12,
            },
        };

        let summaries: Vec<SummaryText> = self
            .post_json(Task::Summarize, &self.summarization_model, &body)
            .await?;

        summaries
            .into_iter()
            .next()
            .map(|s| s.summary_text)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::malformed("huggingface", Task::Summarize, "empty summary list")
            })
    }

    async fn sentiment(&self, text: &str) -> Result<SentimentScore, ProviderError> {
        let body = InputsRequest { inputs: text };

        // text-classification pipelines return either [[{label, score}]] or
        // [{label, score}] depending on the model
        let response: ClassificationResponse = self
            .post_json(Task::Sentiment, &self.sentiment_model, &body)
            .await?;

        let labels = match response {
            ClassificationResponse::Nested(mut groups) => {
                if groups.is_empty() {
                    Vec::new()
                } else {
                    groups.remove(0)
                }
            }
            ClassificationResponse::Flat(labels) => labels,
        };

        let best = labels
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| {
                ProviderError::malformed("huggingface", Task::Sentiment, "empty label list")
            })?;

        Ok(SentimentScore {
            sentiment: Sentiment::from_model_label(&best.label),
            score: best.score.clamp(0.0, 1.0),
        })
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ProviderError> {
        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
            },
        };

        let response: ZeroShotResponse = self
            .post_json(Task::Classify, &self.zero_shot_model, &body)
            .await?;

        if response.labels.len() != response.scores.len() {
            return Err(ProviderError::malformed(
                "huggingface",
                Task::Classify,
                "label/score length mismatch",
            ));
        }

        Ok(response
            .labels
            .into_iter()
            .zip(response.scores)
            .map(|(label, score)| LabelScore {
                label,
                score: score.clamp(0.0, 1.0),
            })
            .collect())
    }
}

// ============================================================================
// Hugging Face API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct InputsRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: SummarizationParameters,
}

#[derive(Debug, Serialize)]
struct SummarizationParameters {
    max_length: u32,
    min_length: u32,
}

#[derive(Debug, Deserialize)]
struct SummaryText {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ClassificationLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<ClassificationLabel>>),
    Flat(Vec<ClassificationLabel>),
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}
