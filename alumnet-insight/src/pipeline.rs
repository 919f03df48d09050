//! The content analysis pipeline.
//!
//! One shared [`Analyzer`] serves every entry point (multipart, text-only,
//! publish, feed batch). Each stage degrades independently: hosted providers
//! first (through the resilience chain), the deterministic fallback tier
//! last. Only blank input is an error; any mix of provider failures still
//! produces a complete [`ContentAnalysis`].

use crate::cache::AnalysisCache;
use crate::fallback;
use crate::provider::{
    HuggingFaceProvider, InferenceProvider, OpenAiProvider, ResilientChain,
};
use crate::types::{AnalysisOrigin, ContentAnalysis, PostContent, StorySummary};
use alumnet_common::config::{AnalysisConfig, Config};
use alumnet_common::util::truncate_with_ellipsis;
use alumnet_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

const MAX_TITLE_CHARS: usize = 80;
const MAX_SUBTITLE_CHARS: usize = 140;

/// The shared analysis pipeline.
///
/// Cheap to clone; clones share the provider chain and the result cache.
#[derive(Clone)]
pub struct Analyzer {
    chain: Option<Arc<ResilientChain>>,
    cache: Option<Arc<AnalysisCache>>,
    candidate_topics: Arc<Vec<String>>,
    batch_max: usize,
    item_timeout: Duration,
}

impl Analyzer {
    /// Create an analyzer from an explicit chain and analysis settings.
    ///
    /// Pass `None` to run in pure deterministic-fallback mode.
    pub fn new(chain: Option<ResilientChain>, analysis: &AnalysisConfig) -> Self {
        let chain = chain.filter(|c| !c.is_empty()).map(Arc::new);

        Self {
            chain,
            cache: AnalysisCache::with_capacity(analysis.cache_capacity).map(Arc::new),
            candidate_topics: Arc::new(analysis.candidate_topics.clone()),
            batch_max: analysis.batch.max_posts,
            item_timeout: Duration::from_secs(analysis.batch.item_timeout_secs),
        }
    }

    /// Create an analyzer from the service configuration, registering every
    /// hosted provider that has credentials.
    pub fn from_config(config: &Config) -> Self {
        let mut providers: Vec<Arc<dyn InferenceProvider>> = Vec::new();

        if let Some(token) = &config.secrets.huggingface {
            providers.push(Arc::new(HuggingFaceProvider::new(
                &config.analysis.huggingface,
                Some(token),
            )));
        }

        if let Some(key) = &config.secrets.openai {
            providers.push(Arc::new(OpenAiProvider::new(&config.analysis.openai, key)));
        }

        if providers.is_empty() {
            tracing::warn!(
                "No hosted inference provider configured; running in deterministic fallback mode"
            );
        } else {
            tracing::info!(providers = providers.len(), "Hosted inference chain ready");
        }

        let chain = if providers.is_empty() {
            None
        } else {
            Some(ResilientChain::new(
                providers,
                config.analysis.reliability.clone(),
            ))
        };

        Self::new(chain, &config.analysis)
    }

    /// True when at least one hosted provider is registered.
    pub fn has_hosted_chain(&self) -> bool {
        self.chain.is_some()
    }

    /// Analyze a single post.
    ///
    /// Blank text is the only error; every provider failure degrades to the
    /// deterministic tier instead.
    pub async fn analyze(&self, post: &PostContent) -> Result<ContentAnalysis> {
        let text = post.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("post content is empty".into()));
        }

        let cache_key = AnalysisCache::key(post);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(cache_key).await {
                tracing::debug!(key = cache_key, "Analysis cache hit");
                return Ok(hit);
            }
        }

        let mut hosted_used = false;
        let mut fallback_used = false;

        // Stage 1: caption. The caption is appended to the working text so
        // the later stages see what the photo shows.
        let mut working = text.to_string();
        if let Some(image) = &post.image {
            match &self.chain {
                Some(chain) => match chain.caption(image).await {
                    Ok(caption) => {
                        hosted_used = true;
                        working.push_str("\n\nPhoto: ");
                        working.push_str(&caption);
                    }
                    Err(err) => {
                        fallback_used = true;
                        tracing::warn!(error = %err, "Captioning degraded; continuing text-only");
                    }
                },
                None => fallback_used = true,
            }
        }

        // Stage 2: story summary.
        let story = match &self.chain {
            Some(chain) => match chain.summarize(&working).await {
                Ok(summary) => {
                    hosted_used = true;
                    shape_story(&summary, text)
                }
                Err(err) => {
                    fallback_used = true;
                    tracing::warn!(error = %err, "Summarization degraded to rule table");
                    fallback::story_for(text)
                }
            },
            None => {
                fallback_used = true;
                fallback::story_for(text)
            }
        };

        // Stages 3+4: sentiment and topics are independent; run them together.
        let (sentiment, confidence, topics) = match &self.chain {
            Some(chain) => {
                let (sentiment_res, topics_res) = tokio::join!(
                    chain.sentiment(&working),
                    chain.classify(&working, &self.candidate_topics)
                );

                let (sentiment, confidence) = match sentiment_res {
                    Ok(scored) => {
                        hosted_used = true;
                        (scored.sentiment, scored.score.clamp(0.0, 1.0))
                    }
                    Err(err) => {
                        fallback_used = true;
                        tracing::warn!(error = %err, "Sentiment degraded to lexicon");
                        (fallback::sentiment_of(text), fallback::FALLBACK_CONFIDENCE)
                    }
                };

                let topics = match topics_res {
                    Ok(labels) if !labels.is_empty() => {
                        hosted_used = true;
                        top_labels(labels)
                    }
                    Ok(_) => {
                        fallback_used = true;
                        fallback::extract_topics(text)
                    }
                    Err(err) => {
                        fallback_used = true;
                        tracing::warn!(error = %err, "Topic classification degraded to keywords");
                        fallback::extract_topics(text)
                    }
                };

                (sentiment, confidence, topics)
            }
            None => {
                fallback_used = true;
                (
                    fallback::sentiment_of(text),
                    fallback::FALLBACK_CONFIDENCE,
                    fallback::extract_topics(text),
                )
            }
        };

        let origin = match (hosted_used, fallback_used) {
            (true, false) => AnalysisOrigin::Hosted,
            (true, true) => AnalysisOrigin::Mixed,
            _ => AnalysisOrigin::Fallback,
        };

        let analysis = ContentAnalysis {
            summary: story.render(),
            sentiment,
            key_topics: topics,
            confidence,
            origin,
        };

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, analysis.clone()).await;
        }

        Ok(analysis)
    }

    /// Analyze a feed of posts concurrently.
    ///
    /// The batch size is validated up front (oversized requests are rejected,
    /// not truncated) and each item gets its own timeout; a timed-out item
    /// degrades to the deterministic fallback. Output order matches input
    /// order.
    pub async fn analyze_batch(&self, posts: Vec<PostContent>) -> Result<Vec<ContentAnalysis>> {
        if posts.is_empty() {
            return Err(Error::InvalidInput("feed is empty".into()));
        }

        if posts.len() > self.batch_max {
            return Err(Error::InvalidInput(format!(
                "feed exceeds the maximum of {} posts per request",
                self.batch_max
            )));
        }

        if posts.iter().any(|p| p.text.trim().is_empty()) {
            return Err(Error::InvalidInput("feed contains an empty post".into()));
        }

        // Kept for recovery when a task times out or dies
        let texts: Vec<String> = posts.iter().map(|p| p.text.clone()).collect();

        let mut join_set: JoinSet<(usize, Result<ContentAnalysis>)> = JoinSet::new();
        for (idx, post) in posts.into_iter().enumerate() {
            let analyzer = self.clone();
            let timeout = self.item_timeout;

            join_set.spawn(async move {
                match tokio::time::timeout(timeout, analyzer.analyze(&post)).await {
                    Ok(result) => (idx, result),
                    Err(_) => {
                        tracing::warn!(index = idx, "Feed item timed out; using fallback");
                        (idx, Ok(fallback_analysis(&post.text)))
                    }
                }
            });
        }

        let mut results: Vec<Option<ContentAnalysis>> = vec![None; texts.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(analysis))) => results[idx] = Some(analysis),
                Ok((idx, Err(err))) => {
                    tracing::warn!(index = idx, error = %err, "Feed item failed; using fallback");
                    results[idx] = Some(fallback_analysis(&texts[idx]));
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "Feed analysis task died");
                }
            }
        }

        // Any slot a dead task left behind still gets fallback output
        Ok(results
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| slot.unwrap_or_else(|| fallback_analysis(&texts[idx])))
            .collect())
    }
}

/// Build a fully deterministic analysis for one post.
pub fn fallback_analysis(text: &str) -> ContentAnalysis {
    ContentAnalysis {
        summary: fallback::story_for(text).render(),
        sentiment: fallback::sentiment_of(text),
        key_topics: fallback::extract_topics(text),
        confidence: fallback::FALLBACK_CONFIDENCE,
        origin: AnalysisOrigin::Fallback,
    }
}

/// Shape a model summary into the title/subtitle convention: first sentence
/// becomes the title, the remainder the subtitle. One-sentence summaries
/// borrow the subtitle from the original post text.
fn shape_story(summary: &str, original: &str) -> StorySummary {
    let cleaned = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    let (first, rest) = fallback::split_first_sentence(&cleaned);

    let title = truncate_with_ellipsis(
        first.trim().trim_end_matches(['.', '!', '?']),
        MAX_TITLE_CHARS,
    );

    let rest = rest.trim();
    let subtitle = if rest.is_empty() {
        let original = original.split_whitespace().collect::<Vec<_>>().join(" ");
        truncate_with_ellipsis(&original, MAX_SUBTITLE_CHARS)
    } else {
        truncate_with_ellipsis(rest, MAX_SUBTITLE_CHARS)
    };

    StorySummary { title, subtitle }
}

/// Keep the top-scoring labels, preserving score order, capped at 5.
fn top_labels(mut labels: Vec<crate::provider::LabelScore>) -> Vec<String> {
    labels.sort_by(|a, b| b.score.total_cmp(&a.score));
    labels
        .into_iter()
        .take(fallback::MAX_TOPICS)
        .map(|l| l.label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LabelScore, ProviderError, SentimentScore, Task};
    use crate::types::{ImageData, Sentiment};
    use alumnet_common::config::ReliabilityConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock provider with per-task failure switches.
    #[derive(Default)]
    struct MockProvider {
        fail_caption: bool,
        fail_summarize: bool,
        fail_sentiment: bool,
        fail_classify: bool,
        calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn failing_all() -> Self {
            Self {
                fail_caption: true,
                fail_summarize: true,
                fail_sentiment: true,
                fail_classify: true,
                ..Default::default()
            }
        }

        fn error(&self, task: Task) -> ProviderError {
            ProviderError {
                provider: "mock".into(),
                task,
                message: "injected failure".into(),
                status_code: Some(500),
                retryable: false,
            }
        }
    }

    #[async_trait]
    impl InferenceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn caption(&self, _image: &ImageData) -> std::result::Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_caption {
                return Err(self.error(Task::Caption));
            }
            Ok("two graduates holding a trophy".into())
        }

        async fn summarize(&self, _text: &str) -> std::result::Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_summarize {
                return Err(self.error(Task::Summarize));
            }
            Ok("Team wins the national round. They now advance to the finals in March.".into())
        }

        async fn sentiment(
            &self,
            _text: &str,
        ) -> std::result::Result<SentimentScore, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_sentiment {
                return Err(self.error(Task::Sentiment));
            }
            Ok(SentimentScore {
                sentiment: Sentiment::Positive,
                score: 0.93,
            })
        }

        async fn classify(
            &self,
            _text: &str,
            _labels: &[String],
        ) -> std::result::Result<Vec<LabelScore>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_classify {
                return Err(self.error(Task::Classify));
            }
            Ok(vec![
                LabelScore {
                    label: "Hackathons".into(),
                    score: 0.9,
                },
                LabelScore {
                    label: "Events".into(),
                    score: 0.6,
                },
            ])
        }
    }

    fn analyzer_with(mock: MockProvider) -> (Analyzer, Arc<AtomicUsize>) {
        let calls = Arc::clone(&mock.calls);
        let chain = ResilientChain::new(
            vec![Arc::new(mock)],
            ReliabilityConfig {
                max_retries: 0,
                base_backoff_ms: 1,
                max_backoff_ms: 2,
            },
        );
        (Analyzer::new(Some(chain), &AnalysisConfig::default()), calls)
    }

    fn fallback_analyzer() -> Analyzer {
        Analyzer::new(None, &AnalysisConfig::default())
    }

    fn image() -> ImageData {
        ImageData {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime: "image/jpeg".into(),
        }
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let analyzer = fallback_analyzer();
        let err = analyzer.analyze(&PostContent::text("   ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn no_chain_produces_fallback_analysis() {
        let analyzer = fallback_analyzer();
        let analysis = analyzer
            .analyze(&PostContent::text("Won the hackathon, so proud of the team!"))
            .await
            .unwrap();

        assert_eq!(analysis.origin, AnalysisOrigin::Fallback);
        assert_eq!(analysis.confidence, fallback::FALLBACK_CONFIDENCE);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert!(analysis.summary.contains("\n\n"));
        assert!(!analysis.key_topics.is_empty());
        assert!(analysis.key_topics.len() <= fallback::MAX_TOPICS);
    }

    #[tokio::test]
    async fn hosted_path_reports_model_confidence() {
        let (analyzer, _) = analyzer_with(MockProvider::default());
        let analysis = analyzer
            .analyze(&PostContent::text("We won the national hackathon round!"))
            .await
            .unwrap();

        assert_eq!(analysis.origin, AnalysisOrigin::Hosted);
        assert!((analysis.confidence - 0.93).abs() < 1e-9);
        assert_eq!(analysis.key_topics, vec!["Hackathons", "Events"]);
        // Model summary is shaped into title and subtitle
        assert_eq!(
            analysis.summary,
            "Team wins the national round\n\nThey now advance to the finals in March."
        );
    }

    #[tokio::test]
    async fn failing_chain_degrades_to_fallback() {
        let (analyzer, _) = analyzer_with(MockProvider::failing_all());
        let analysis = analyzer
            .analyze(&PostContent::text("Scored an sgpa of 8.9 this semester"))
            .await
            .unwrap();

        assert_eq!(analysis.origin, AnalysisOrigin::Fallback);
        assert_eq!(analysis.confidence, fallback::FALLBACK_CONFIDENCE);
        assert!(analysis.summary.contains("8.9"));
    }

    #[tokio::test]
    async fn caption_failure_yields_mixed_origin() {
        let mock = MockProvider {
            fail_caption: true,
            ..Default::default()
        };
        let (analyzer, _) = analyzer_with(mock);

        let analysis = analyzer
            .analyze(&PostContent::with_image("Reunion photo dump!", image()))
            .await
            .unwrap();

        assert_eq!(analysis.origin, AnalysisOrigin::Mixed);
    }

    #[tokio::test]
    async fn repeat_analysis_hits_cache() {
        let (analyzer, calls) = analyzer_with(MockProvider::default());
        let post = PostContent::text("Placed at Acme, joining in July!");

        let first = analyzer.analyze(&post).await.unwrap();
        let calls_after_first = calls.load(Ordering::SeqCst);
        let second = analyzer.analyze(&post).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let analyzer = fallback_analyzer();
        let posts = vec![
            PostContent::text("Scored an sgpa of 9.9"),
            PostContent::text("Won the hackathon finals"),
            PostContent::text("Visited campus today"),
        ];

        let results = analyzer.analyze_batch(posts).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].summary.contains("9.9"));
        assert!(results[1].summary.starts_with("Hackathon Story"));
    }

    #[tokio::test]
    async fn batch_rejects_oversized_feeds() {
        let analyzer = fallback_analyzer();
        let posts = (0..26)
            .map(|i| PostContent::text(format!("post {}", i)))
            .collect();

        let err = analyzer.analyze_batch(posts).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn batch_rejects_empty_feed_and_empty_posts() {
        let analyzer = fallback_analyzer();

        assert!(analyzer.analyze_batch(Vec::new()).await.is_err());

        let posts = vec![PostContent::text("fine"), PostContent::text("  ")];
        assert!(analyzer.analyze_batch(posts).await.is_err());
    }

    #[test]
    fn shape_story_single_sentence_borrows_subtitle() {
        let story = shape_story("A short headline only.", "The original post text here");
        assert_eq!(story.title, "A short headline only");
        assert_eq!(story.subtitle, "The original post text here");
    }
}
