//! AlumNet Common - Shared types, utilities, and configuration for the AlumNet services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup and structured logging helpers
//! - Utility functions used across AlumNet services

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    AnalysisConfig, BackendConfig, BatchConfig, Config, GatewayConfig, HuggingFaceConfig,
    NetworkConfig, ObservabilityConfig, OpenAiConfig, ReliabilityConfig, SecretsConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{AnalysisConfig, BackendConfig, Config, GatewayConfig, SecretsConfig};
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
