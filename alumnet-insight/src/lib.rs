//! AlumNet Insight - Content analysis for alumni community posts.
//!
//! This crate provides the shared analysis pipeline behind every AlumNet
//! story endpoint:
//! - Hosted inference providers (Hugging Face Inference API, OpenAI)
//! - A resilience chain with retry, backoff, and provider fallthrough
//! - A deterministic fallback tier (rule table, keyword topics, lexicon)
//! - A bounded result cache
//!
//! The pipeline degrades rather than fails: blank input is the only error a
//! caller will ever see.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod cache;
pub mod fallback;
pub mod pipeline;
pub mod provider;
pub mod types;

pub use cache::AnalysisCache;
pub use pipeline::{fallback_analysis, Analyzer};
pub use provider::{
    HuggingFaceProvider, InferenceProvider, LabelScore, OpenAiProvider, ProviderError,
    ResilientChain, SentimentScore, Task,
};
pub use types::{
    AnalysisOrigin, ContentAnalysis, ImageData, PostContent, Sentiment, StorySummary,
};
