//! Integration tests for the Hugging Face Inference API client.
//!
//! Exercises the real HTTP client against a mocked Inference API, covering
//! each task's response shape and the error classification the resilience
//! chain depends on.

use alumnet_common::config::HuggingFaceConfig;
use alumnet_insight::provider::{HuggingFaceProvider, InferenceProvider};
use alumnet_insight::types::{ImageData, Sentiment};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> HuggingFaceConfig {
    HuggingFaceConfig {
        api_base: server.uri(),
        ..Default::default()
    }
}

#[tokio::test]
async fn summarize_parses_summary_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .and(body_partial_json(serde_json::json!({
            "inputs": "Long post about the reunion weekend."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "Alumni gather for the reunion weekend." }
        ])))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let summary = provider
        .summarize("Long post about the reunion weekend.")
        .await
        .unwrap();

    assert_eq!(summary, "Alumni gather for the reunion weekend.");
}

#[tokio::test]
async fn api_token_is_sent_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .and(header("authorization", "Bearer hf_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "ok" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), Some("hf_test_token"));
    provider.summarize("anything").await.unwrap();
}

#[tokio::test]
async fn sentiment_handles_nested_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/models/distilbert-base-uncased-finetuned-sst-2-english",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[
            { "label": "POSITIVE", "score": 0.97 },
            { "label": "NEGATIVE", "score": 0.03 }
        ]])))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let scored = provider.sentiment("So happy about the results!").await.unwrap();

    assert_eq!(scored.sentiment, Sentiment::Positive);
    assert!((scored.score - 0.97).abs() < 1e-9);
}

#[tokio::test]
async fn classify_zips_labels_and_scores() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-mnli"))
        .and(body_partial_json(serde_json::json!({
            "parameters": { "candidate_labels": ["Placements", "Events"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sequence": "got placed today",
            "labels": ["Placements", "Events"],
            "scores": [0.91, 0.12]
        })))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let labels = provider
        .classify(
            "got placed today",
            &["Placements".to_string(), "Events".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0].label, "Placements");
    assert!(labels[0].score > labels[1].score);
}

#[tokio::test]
async fn caption_posts_raw_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/Salesforce/blip-image-captioning-large"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "generated_text": "a group of people at a graduation ceremony" }
        ])))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let caption = provider
        .caption(&ImageData {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            mime: "image/jpeg".into(),
        })
        .await
        .unwrap();

    assert!(caption.contains("graduation"));
}

#[tokio::test]
async fn cold_model_503_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": "Model facebook/bart-large-cnn is currently loading",
            "estimated_time": 20.0
        })))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let err = provider.summarize("anything").await.unwrap_err();

    assert!(err.retryable);
    assert_eq!(err.status_code, Some(503));
}

#[tokio::test]
async fn unauthorized_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let err = provider.summarize("anything").await.unwrap_err();

    assert!(!err.retryable);
    assert_eq!(err.status_code, Some(401));
}

#[tokio::test]
async fn malformed_body_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(&config_for(&server), None);
    let err = provider.summarize("anything").await.unwrap_err();

    assert!(!err.retryable);
    assert!(err.message.contains("Malformed"));
}
