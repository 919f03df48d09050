//! Error types for the AlumNet services.

use thiserror::Error;

/// Result type alias using the AlumNet error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for AlumNet services.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request payload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// External service error (hosted inference, alumni backend)
    #[error("External service error: {0}")]
    External(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error came from an external collaborator.
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::RateLimited(_) => 429,
            Self::Timeout => 408,
            Self::External(_) => 502,
            Self::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }

    /// Get the machine-readable error code used in HTTP error bodies.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::RateLimited(_) => "rate_limited",
            Self::External(_) => "bad_gateway",
            Self::Timeout => "timeout",
            Self::WithContext { source, .. } => source.code(),
            _ => "internal_error",
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::InvalidInput("test".into()).status_code(), 400);
        assert_eq!(Error::NotFound("test".into()).status_code(), 404);
        assert_eq!(Error::PayloadTooLarge("test".into()).status_code(), 413);
        assert_eq!(Error::RateLimited("test".into()).status_code(), 429);
        assert_eq!(Error::External("test".into()).status_code(), 502);
        assert_eq!(Error::Internal("test".into()).status_code(), 500);
        assert_eq!(Error::Timeout.status_code(), 408);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidInput("x".into()).code(), "invalid_input");
        assert_eq!(Error::External("x".into()).code(), "bad_gateway");
        assert_eq!(Error::Internal("x".into()).code(), "internal_error");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::External("model unavailable".into());
        let with_ctx = err.with_context("analyzing story");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(with_ctx.status_code(), 502);
        assert_eq!(with_ctx.code(), "bad_gateway");
    }
}
