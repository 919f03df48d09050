//! Configuration management for AlumNet services.
//!
//! All AlumNet services share a unified configuration file at `~/.alumnet/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Explicit config file values
//! 2. Environment variables
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! ## Service
//! - `ALUMNET_GATEWAY_PORT` → gateway.port
//! - `ALUMNET_BIND_ADDRESS` → network.bind
//!
//! ## Integration points
//! - `ALUMNI_BACKEND_URL` → backend.base_url
//! - `HUGGINGFACE_API_KEY` → secrets.huggingface
//! - `OPENAI_API_KEY` → secrets.openai
//!
//! ## Observability
//! - `ALUMNET_LOG_LEVEL` → observability.log_level
//! - `ALUMNET_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".alumnet"),
        |dirs| dirs.home_dir().join(".alumnet"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Global network configuration.
///
/// Controls the bind address for the gateway. Default is `127.0.0.1` (local
/// only). Set to `0.0.0.0` to allow remote access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bind address for the gateway.
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

// ============================================================================
// Gateway Configuration
// ============================================================================

/// Gateway service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port the gateway listens on.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Maximum accepted upload size in bytes (multipart image + text).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_gateway_port() -> u16 {
    8090
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

// ============================================================================
// Backend Configuration
// ============================================================================

/// Alumni backend API configuration.
///
/// The backend owns profiles, connections, messaging, events, and campaigns;
/// the gateway only forwards requests to it, passing the caller's
/// `Authorization` header through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the alumni backend API.
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout in seconds for proxied calls.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum proxied request body size in bytes.
    #[serde(default = "default_backend_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
            max_body_bytes: default_backend_max_body_bytes(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:4000".into()
}

fn default_backend_timeout_secs() -> u64 {
    30
}

fn default_backend_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

// ============================================================================
// Analysis Configuration
// ============================================================================

/// Content analysis pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hugging Face Inference API settings (first-tier provider).
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,

    /// OpenAI Chat Completions settings (second-tier provider).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Retry and fallback behavior for hosted providers.
    #[serde(default)]
    pub reliability: ReliabilityConfig,

    /// Batch analysis limits.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Capacity of the bounded analysis result cache. 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Candidate labels offered to the zero-shot topic classifier.
    #[serde(default = "default_candidate_topics")]
    pub candidate_topics: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            huggingface: HuggingFaceConfig::default(),
            openai: OpenAiConfig::default(),
            reliability: ReliabilityConfig::default(),
            batch: BatchConfig::default(),
            cache_capacity: default_cache_capacity(),
            candidate_topics: default_candidate_topics(),
        }
    }
}

fn default_cache_capacity() -> usize {
    256
}

fn default_candidate_topics() -> Vec<String> {
    [
        "Placements",
        "Interviews",
        "Hackathons",
        "Academics",
        "Internships",
        "Higher Studies",
        "Research",
        "Events",
        "Career Growth",
        "Giving Back",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// Hugging Face Inference API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// API base URL. Overridable for tests.
    #[serde(default = "default_hf_api_base")]
    pub api_base: String,

    /// Summarization model id.
    #[serde(default = "default_hf_summarization_model")]
    pub summarization_model: String,

    /// Sentiment model id.
    #[serde(default = "default_hf_sentiment_model")]
    pub sentiment_model: String,

    /// Zero-shot classification model id.
    #[serde(default = "default_hf_zero_shot_model")]
    pub zero_shot_model: String,

    /// Image captioning model id.
    #[serde(default = "default_hf_caption_model")]
    pub caption_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_hf_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_base: default_hf_api_base(),
            summarization_model: default_hf_summarization_model(),
            sentiment_model: default_hf_sentiment_model(),
            zero_shot_model: default_hf_zero_shot_model(),
            caption_model: default_hf_caption_model(),
            timeout_secs: default_hf_timeout_secs(),
        }
    }
}

fn default_hf_api_base() -> String {
    "https://api-inference.huggingface.co".into()
}

fn default_hf_summarization_model() -> String {
    "facebook/bart-large-cnn".into()
}

fn default_hf_sentiment_model() -> String {
    "distilbert-base-uncased-finetuned-sst-2-english".into()
}

fn default_hf_zero_shot_model() -> String {
    "facebook/bart-large-mnli".into()
}

fn default_hf_caption_model() -> String {
    "Salesforce/blip-image-captioning-large".into()
}

fn default_hf_timeout_secs() -> u64 {
    20
}

/// OpenAI Chat Completions configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL. Overridable for Azure-style deployments and tests.
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Text model for summarization, sentiment, and topic prompts.
    #[serde(default = "default_openai_chat_model")]
    pub chat_model: String,

    /// Vision-capable model for image captioning.
    #[serde(default = "default_openai_vision_model")]
    pub vision_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion budget per call.
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: i64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            chat_model: default_openai_chat_model(),
            vision_model: default_openai_vision_model(),
            timeout_secs: default_openai_timeout_secs(),
            max_tokens: default_openai_max_tokens(),
        }
    }
}

fn default_openai_api_base() -> String {
    "https://api.openai.com".into()
}

fn default_openai_chat_model() -> String {
    "gpt-4o-mini".into()
}

fn default_openai_vision_model() -> String {
    "gpt-4o".into()
}

fn default_openai_timeout_secs() -> u64 {
    30
}

fn default_openai_max_tokens() -> i64 {
    300
}

/// Retry and fallback behavior for hosted providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Maximum number of retries per provider before falling through.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubles with each retry).
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

/// Batch analysis limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of posts accepted per feed analysis request.
    /// Oversized requests are rejected, not truncated.
    #[serde(default = "default_batch_max_posts")]
    pub max_posts: usize,

    /// Per-item analysis timeout in seconds. A timed-out item degrades to
    /// the deterministic fallback rather than failing the batch.
    #[serde(default = "default_batch_item_timeout_secs")]
    pub item_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_posts: default_batch_max_posts(),
            item_timeout_secs: default_batch_item_timeout_secs(),
        }
    }
}

fn default_batch_max_posts() -> usize {
    25
}

fn default_batch_item_timeout_secs() -> u64 {
    20
}

// ============================================================================
// Secrets Configuration
// ============================================================================

/// API credentials for hosted inference providers.
///
/// Both keys are optional; with neither present the pipeline runs in pure
/// deterministic-fallback mode.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// Hugging Face Inference API token.
    #[serde(default)]
    pub huggingface: Option<String>,

    /// OpenAI API key.
    #[serde(default)]
    pub openai: Option<String>,
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for AlumNet services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Network bind settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Gateway service settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Alumni backend integration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Content analysis pipeline settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Hosted provider credentials.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Logging settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, applying env overrides.
    ///
    /// A missing config file is not an error; defaults are used.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit path without env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("ALUMNET_BIND_ADDRESS") {
            if !bind.is_empty() {
                self.network.bind = bind;
            }
        }

        if let Ok(port) = std::env::var("ALUMNET_GATEWAY_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        if let Ok(url) = std::env::var("ALUMNI_BACKEND_URL") {
            if !url.is_empty() {
                self.backend.base_url = url;
            }
        }

        if let Ok(key) = std::env::var("HUGGINGFACE_API_KEY") {
            if !key.is_empty() {
                self.secrets.huggingface = Some(key);
            }
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.secrets.openai = Some(key);
            }
        }

        if let Ok(level) = std::env::var("ALUMNET_LOG_LEVEL") {
            if !level.is_empty() {
                self.observability.log_level = level;
            }
        }

        if let Ok(format) = std::env::var("ALUMNET_LOG_FORMAT") {
            if !format.is_empty() {
                self.observability.log_format = format;
            }
        }
    }

    /// True when at least one hosted inference provider is configured.
    pub fn has_hosted_provider(&self) -> bool {
        self.secrets.huggingface.is_some() || self.secrets.openai.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.bind, "127.0.0.1");
        assert_eq!(config.gateway.port, 8090);
        assert_eq!(config.backend.base_url, "http://localhost:4000");
        assert_eq!(config.analysis.batch.max_posts, 25);
        assert_eq!(config.analysis.cache_capacity, 256);
        assert!(!config.analysis.candidate_topics.is_empty());
        assert!(!config.has_hosted_provider());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.gateway.port, 8090);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "gateway": {{ "port": 9100 }},
                "backend": {{ "base_url": "http://backend.internal:4000" }},
                "secrets": {{ "huggingface": "hf_test" }}
            }}"#
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.backend.base_url, "http://backend.internal:4000");
        assert_eq!(config.secrets.huggingface.as_deref(), Some("hf_test"));
        // Untouched sections keep defaults
        assert_eq!(config.network.bind, "127.0.0.1");
        assert_eq!(config.analysis.reliability.max_retries, 2);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
