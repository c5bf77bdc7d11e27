//! Context logger configuration
//!
//! Built in code through [`ContextLoggerConfig::builder`] or read from the
//! environment with `envy`:
//!
//! ```ignore
//! use ctxlog_core::{load_dotenv, ContextLoggerConfig};
//!
//! load_dotenv();
//! // CTXLOG_TRACE_ID_FIELD=upstream-span CTXLOG_LOG_REQUESTS=false
//! let config = ContextLoggerConfig::from_env_prefixed("CTXLOG")?;
//! ```

use crate::error::ConfigError;
use crate::propagation::REQUEST_ID_HEADER;
use http::HeaderName;
use serde::Deserialize;
use std::path::Path;

/// Configuration for [`ContextLoggerLayer`](crate::middleware::ContextLoggerLayer)
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContextLoggerConfig {
    /// Secondary context key checked for a span when the primary one is empty
    pub trace_id_field: Option<String>,
    /// Response header echoing the correlation id (`None` disables it)
    pub response_header: Option<String>,
    /// Log request start and completion through the request logger
    pub log_requests: bool,
    /// Parse an inbound `traceparent` header into the primary span slot
    pub extract_traceparent: bool,
    /// Path prefixes excluded from request start/completion lines
    pub skip_paths: Vec<String>,
}

impl Default for ContextLoggerConfig {
    fn default() -> Self {
        Self {
            trace_id_field: None,
            response_header: Some(REQUEST_ID_HEADER.to_string()),
            log_requests: true,
            extract_traceparent: false,
            skip_paths: vec!["/health".to_string(), "/metrics".to_string()],
        }
    }
}

impl ContextLoggerConfig {
    /// Create a new builder for ContextLoggerConfig
    pub fn builder() -> ContextLoggerConfigBuilder {
        ContextLoggerConfigBuilder::default()
    }

    /// Load configuration from unprefixed environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `{PREFIX}_*` environment variables
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        let config: Self = envy::prefixed(format!("{}_", prefix)).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.response_header {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName {
                field: "response_header",
                value: name.clone(),
            })?;
        }
        Ok(())
    }

    /// Whether request start/completion lines are skipped for `path`
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Builder for ContextLoggerConfig
#[derive(Clone, Debug, Default)]
pub struct ContextLoggerConfigBuilder {
    config: ContextLoggerConfig,
}

impl ContextLoggerConfigBuilder {
    /// Set the secondary span key
    pub fn trace_id_field(mut self, field: impl Into<String>) -> Self {
        self.config.trace_id_field = Some(field.into());
        self
    }

    /// Set the response header carrying the correlation id
    pub fn response_header(mut self, header: impl Into<String>) -> Self {
        self.config.response_header = Some(header.into());
        self
    }

    /// Do not echo the correlation id on responses
    pub fn no_response_header(mut self) -> Self {
        self.config.response_header = None;
        self
    }

    /// Enable or disable request start/completion lines
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.config.log_requests = enabled;
        self
    }

    /// Enable or disable `traceparent` extraction
    pub fn extract_traceparent(mut self, enabled: bool) -> Self {
        self.config.extract_traceparent = enabled;
        self
    }

    /// Add a path prefix to skip
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.config.skip_paths.push(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContextLoggerConfig {
        self.config
    }
}

/// Load a `.env` file into the process environment if one exists
///
/// Searches the current directory and its ancestors.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) => report_dotenv_error(&err),
    }
}

/// Load environment variables from the file at `path`, if it exists
pub fn load_dotenv_from(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) => report_dotenv_error(&err),
    }
}

fn report_dotenv_error(err: &dotenvy::Error) {
    if !err.not_found() {
        tracing::warn!(error = %err, "failed to load .env file");
    }
}
