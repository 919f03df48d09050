//! Resilient provider chain with retry and fallback support.
//!
//! Wraps the hosted providers in a chain that retries transient failures
//! with exponential backoff and falls through to the next provider when a
//! provider is exhausted. The deterministic fallback tier lives outside this
//! chain, in the pipeline, so a fully failed chain is still not a pipeline
//! failure.

use super::{InferenceProvider, LabelScore, ProviderError, SentimentScore, Task};
use crate::types::ImageData;
use alumnet_common::config::ReliabilityConfig;
use alumnet_common::util::sanitize_for_log;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// A chain of hosted providers tried in order, with per-provider retries.
pub struct ResilientChain {
    providers: Vec<Arc<dyn InferenceProvider>>,
    config: ReliabilityConfig,
}

impl ResilientChain {
    /// Create a new chain. The first provider is primary, the rest fallbacks.
    pub fn new(providers: Vec<Arc<dyn InferenceProvider>>, config: ReliabilityConfig) -> Self {
        Self { providers, config }
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no hosted provider is configured.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Calculate backoff delay for a given attempt.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .base_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.config.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }

    /// Describe an image via the first provider that succeeds.
    pub async fn caption(&self, image: &ImageData) -> Result<String, ProviderError> {
        self.run(Task::Caption, |p| p.caption(image)).await
    }

    /// Summarize text via the first provider that succeeds.
    pub async fn summarize(&self, text: &str) -> Result<String, ProviderError> {
        self.run(Task::Summarize, |p| p.summarize(text)).await
    }

    /// Classify sentiment via the first provider that succeeds.
    pub async fn sentiment(&self, text: &str) -> Result<SentimentScore, ProviderError> {
        self.run(Task::Sentiment, |p| p.sentiment(text)).await
    }

    /// Score candidate topics via the first provider that succeeds.
    pub async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ProviderError> {
        self.run(Task::Classify, |p| p.classify(text, labels)).await
    }

    /// Drive one task through the chain: retry transient failures per
    /// provider, then fall through to the next provider.
    async fn run<'a, T, F>(&'a self, task: Task, call: F) -> Result<T, ProviderError>
    where
        F: Fn(&'a dyn InferenceProvider) -> BoxFuture<'a, Result<T, ProviderError>>,
    {
        let mut failures: Vec<String> = Vec::new();

        for (provider_idx, provider) in self.providers.iter().enumerate() {
            let provider_name = provider.name();

            for attempt in 0..=self.config.max_retries {
                match call(provider.as_ref()).await {
                    Ok(value) => {
                        if attempt > 0 {
                            tracing::info!(
                                provider = provider_name,
                                task = %task,
                                attempt = attempt + 1,
                                "Provider recovered after retries"
                            );
                        }
                        return Ok(value);
                    }
                    Err(err) => {
                        failures.push(format!(
                            "{} attempt {}/{}: {}",
                            provider_name,
                            attempt + 1,
                            self.config.max_retries + 1,
                            sanitize_for_log(&err.message)
                        ));

                        // 4xx responses won't improve on retry
                        if !err.retryable {
                            break;
                        }

                        if attempt < self.config.max_retries {
                            let delay = self.backoff_delay(attempt);
                            tracing::warn!(
                                provider = provider_name,
                                task = %task,
                                attempt = attempt + 1,
                                max_retries = self.config.max_retries,
                                delay_ms = delay.as_millis() as u64,
                                "Provider call failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }

            if provider_idx + 1 < self.providers.len() {
                tracing::warn!(
                    failed_provider = provider_name,
                    task = %task,
                    next_provider = self.providers[provider_idx + 1].name(),
                    "Switching to fallback provider"
                );
            }
        }

        Err(ProviderError {
            provider: "chain".to_string(),
            task,
            message: format!("All providers failed. Attempts:\n{}", failures.join("\n")),
            status_code: None,
            retryable: false,
        })
    }
}
