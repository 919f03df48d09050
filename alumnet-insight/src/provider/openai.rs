//! OpenAI Chat Completions provider.
//!
//! Second-tier provider. Every task is expressed as a constrained chat
//! prompt; captioning uses the vision variant with an inline data URL.

use super::{InferenceProvider, LabelScore, ProviderError, SentimentScore, Task};
use crate::types::{ImageData, Sentiment};
use alumnet_common::config::OpenAiConfig;
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const SUMMARY_SYSTEM: &str = "You summarize alumni community posts. Reply with one short \
headline sentence, then the rest of the summary. Two to three sentences total, plain text.";

const SENTIMENT_SYSTEM: &str = "You classify the sentiment of alumni community posts. Reply \
with exactly one line: a label (Positive, Negative or Neutral), a space, and a confidence \
between 0 and 1.";

const TOPICS_SYSTEM: &str = "You tag alumni community posts. From the candidate labels given, \
reply with up to 5 that apply, comma-separated, most relevant first. Use only labels from the \
list.";

const CAPTION_PROMPT: &str = "Describe this photo in one short sentence.";

/// OpenAI Chat Completions provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_base: String,
    chat_model: String,
    vision_model: String,
    max_tokens: i64,
}

impl OpenAiProvider {
    /// Create a new provider from config and an API key.
    pub fn new(config: &OpenAiConfig, api_key: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Send a chat completion and return the first choice's content.
    async fn chat(
        &self,
        task: Task,
        model: &str,
        system: &str,
        content: MessageContent,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::transport("openai", task, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                "openai",
                task,
                status.as_u16(),
                &body,
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed("openai", task, e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed("openai", task, "no choices"))
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn caption(&self, image: &ImageData) -> Result<String, ProviderError> {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime,
            base64::engine::general_purpose::STANDARD.encode(&image.bytes)
        );

        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: CAPTION_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            },
        ]);

        let caption = self
            .chat(Task::Caption, &self.vision_model, CAPTION_PROMPT, content)
            .await?;
        Ok(caption.trim().to_string())
    }

    async fn summarize(&self, text: &str) -> Result<String, ProviderError> {
        let summary = self
            .chat(
                Task::Summarize,
                &self.chat_model,
                SUMMARY_SYSTEM,
                MessageContent::Text(text.to_string()),
            )
            .await?;
        Ok(summary.trim().to_string())
    }

    async fn sentiment(&self, text: &str) -> Result<SentimentScore, ProviderError> {
        let reply = self
            .chat(
                Task::Sentiment,
                &self.chat_model,
                SENTIMENT_SYSTEM,
                MessageContent::Text(text.to_string()),
            )
            .await?;

        Ok(parse_sentiment_reply(&reply))
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ProviderError> {
        let prompt = format!("Candidate labels: {}.\n\nPost:\n{}", labels.join(", "), text);
        let reply = self
            .chat(
                Task::Classify,
                &self.chat_model,
                TOPICS_SYSTEM,
                MessageContent::Text(prompt),
            )
            .await?;

        Ok(parse_topics_reply(&reply, labels))
    }
}

/// Parse a `<label> <confidence>` sentiment reply.
///
/// The confidence is optional in practice; a missing or unparsable number
/// degrades to a conservative 0.7.
fn parse_sentiment_reply(reply: &str) -> SentimentScore {
    let line = reply.lines().next().unwrap_or_default().trim();
    let mut parts = line.split_whitespace();

    let sentiment = parts
        .next()
        .map(Sentiment::from_model_label)
        .unwrap_or_default();

    let score = parts
        .next()
        .and_then(|s| s.trim_matches(|c: char| !c.is_ascii_digit() && c != '.').parse::<f64>().ok())
        .unwrap_or(0.7)
        .clamp(0.0, 1.0);

    SentimentScore { sentiment, score }
}

/// Parse a comma-separated topics reply back onto the candidate list.
///
/// Labels the model invented are dropped; surviving labels get descending
/// positional scores since chat models report no calibrated signal.
fn parse_topics_reply(reply: &str, candidates: &[String]) -> Vec<LabelScore> {
    let mut seen: Vec<LabelScore> = Vec::new();

    for (idx, raw) in reply.split(',').enumerate().take(5) {
        let cleaned = raw.trim().trim_matches(|c| c == '.' || c == '"');
        let Some(canonical) = candidates
            .iter()
            .find(|c| c.eq_ignore_ascii_case(cleaned))
        else {
            continue;
        };

        if seen.iter().any(|s| s.label == *canonical) {
            continue;
        }

        seen.push(LabelScore {
            label: canonical.clone(),
            score: (0.9 - 0.1 * idx as f64).max(0.5),
        });
    }

    seen
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: i64,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentiment_reply_with_confidence() {
        let parsed = parse_sentiment_reply("Positive 0.93");
        assert_eq!(parsed.sentiment, Sentiment::Positive);
        assert!((parsed.score - 0.93).abs() < 1e-9);
    }

    #[test]
    fn test_parse_sentiment_reply_label_only() {
        let parsed = parse_sentiment_reply("Negative");
        assert_eq!(parsed.sentiment, Sentiment::Negative);
        assert!((parsed.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_parse_sentiment_reply_garbage() {
        let parsed = parse_sentiment_reply("cannot classify this");
        assert_eq!(parsed.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_parse_topics_reply_filters_invented_labels() {
        let candidates = vec!["Placements".to_string(), "Events".to_string()];
        let parsed = parse_topics_reply("Placements, Blockchain, events", &candidates);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].label, "Placements");
        // Case-insensitive match snaps back to the canonical label
        assert_eq!(parsed[1].label, "Events");
        assert!(parsed[0].score > parsed[1].score);
    }

    #[test]
    fn test_parse_topics_reply_dedupes() {
        let candidates = vec!["Events".to_string()];
        let parsed = parse_topics_reply("Events, events, EVENTS", &candidates);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_vision_content_serialization() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "look".into(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/jpeg;base64,AAAA".into(),
                },
            },
        ]);

        let json = serde_json::to_string(&content).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""type":"image_url""#));
        assert!(json.contains("base64"));
    }
}
