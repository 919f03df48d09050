//! Configuration validation for AlumNet services.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;
use url::Url;

use crate::config::{
    AnalysisConfig, BackendConfig, Config, GatewayConfig, ObservabilityConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be nonzero")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.gateway.validate() {
            errors.push(e);
        }

        if let Err(e) = self.backend.validate() {
            errors.push(e);
        }

        if let Err(e) = self.analysis.validate() {
            errors.push(e);
        }

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "gateway.port".into(),
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "gateway.max_upload_bytes".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(())
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingField {
                field: "backend.base_url".into(),
            });
        }

        let url = Url::parse(&self.base_url).map_err(|e| ValidationError::InvalidValue {
            field: "backend.base_url".into(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ValidationError::InvalidValue {
                field: "backend.base_url".into(),
                reason: format!("unsupported scheme: {}", url.scheme()),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "backend.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(())
    }
}

impl Validate for AnalysisConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.batch.max_posts == 0 {
            return Err(ValidationError::InvalidValue {
                field: "analysis.batch.max_posts".into(),
                reason: "must be greater than zero".into(),
            });
        }

        if self.batch.item_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "analysis.batch.item_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        if self.reliability.base_backoff_ms > self.reliability.max_backoff_ms {
            return Err(ValidationError::InvalidValue {
                field: "analysis.reliability.base_backoff_ms".into(),
                reason: "must not exceed max_backoff_ms".into(),
            });
        }

        if self.candidate_topics.is_empty() {
            return Err(ValidationError::MissingField {
                field: "analysis.candidate_topics".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("unknown level: {}", self.log_level),
            });
        }

        const FORMATS: &[&str] = &["json", "pretty"];
        if !FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("unknown format: {}", self.log_format),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.gateway.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPort { .. })
        ));
    }

    #[test]
    fn test_bad_backend_url_rejected() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_backend_scheme_rejected() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://localhost:4000".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "backend.base_url"
        ));
    }

    #[test]
    fn test_multiple_errors_accumulated() {
        let mut config = Config::default();
        config.gateway.port = 0;
        config.observability.log_level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Multiple(errs)) if errs.len() == 2
        ));
    }

    #[test]
    fn test_empty_candidate_topics_rejected() {
        let mut config = Config::default();
        config.analysis.candidate_topics.clear();
        assert!(config.validate().is_err());
    }
}
