//! Error types for ctxlog

use thiserror::Error;

/// Errors raised while loading the logging configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid header name for {field}: {value:?}")]
    InvalidHeaderName { field: &'static str, value: String },
}
