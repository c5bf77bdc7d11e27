//! Logger handles
//!
//! A [`Logger`] is the per-request object application code logs through. It
//! carries a list of pre-attached fields and a [`Sink`] that decides where
//! lines go: straight to the `tracing` dispatcher, or into the request's
//! aggregate [`LogBuffer`]. The sink is chosen once, when the logger is bound.

use crate::buffer::LogBuffer;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::Level;

/// Field carrying the correlation identifier
pub const REQUEST_ID_FIELD: &str = "requestID";

/// Field carrying the HTTP method
pub const METHOD_FIELD: &str = "method";

/// Field carrying the HTTP request path
pub const PATH_FIELD: &str = "path";

/// Returned when no correlation identifier has been attached yet
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

const WELL_KNOWN_FIELDS: [&str; 3] = [REQUEST_ID_FIELD, METHOD_FIELD, PATH_FIELD];

/// Target for events emitted by direct loggers
pub const LOG_TARGET: &str = "ctxlog";

/// Where a logger's lines end up
#[derive(Clone, Debug)]
pub enum Sink {
    /// Emit each line immediately through `tracing`
    Direct,
    /// Collect lines in a per-request buffer flushed by the aggregate sink
    Aggregated(Arc<LogBuffer>),
}

/// Structured logger handle
///
/// Cloning is cheap and clones share identity, see [`Logger::ptr_eq`].
/// Deriving a logger with [`with_field`](Logger::with_field) or
/// [`with_sink`](Logger::with_sink) produces a new handle and leaves the
/// original untouched.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    fields: Vec<(String, String)>,
    sink: Sink,
}

impl Logger {
    /// Create a direct logger with no fields
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Sink::Direct)
    }

    fn from_parts(fields: Vec<(String, String)>, sink: Sink) -> Self {
        Self {
            inner: Arc::new(LoggerInner { fields, sink }),
        }
    }

    /// Derive a logger with one more field
    ///
    /// A field with the same key replaces the existing one in place.
    pub fn with_field(&self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with_fields([(key.into(), value.to_string())])
    }

    /// Derive a logger with several more fields layered on top
    pub fn with_fields<K, V, I>(&self, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut merged = self.inner.fields.clone();
        for (key, value) in fields {
            let (key, value) = (key.into(), value.into());
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = value,
                None => merged.push((key, value)),
            }
        }
        Self::from_parts(merged, self.inner.sink.clone())
    }

    /// Derive a logger writing to a different sink, keeping the fields
    pub fn with_sink(&self, sink: Sink) -> Self {
        Self::from_parts(self.inner.fields.clone(), sink)
    }

    /// Attached fields, in insertion order
    pub fn fields(&self) -> &[(String, String)] {
        &self.inner.fields
    }

    /// Value of an attached field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The sink this logger writes to
    pub fn sink(&self) -> &Sink {
        &self.inner.sink
    }

    /// Whether lines are buffered for an aggregate sink
    pub fn is_aggregated(&self) -> bool {
        matches!(self.inner.sink, Sink::Aggregated(_))
    }

    /// Whether two handles are the same logger (not merely equal)
    pub fn ptr_eq(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Log a message at the given level
    ///
    /// Direct loggers emit `requestID`, `method` and `path` as their own event
    /// fields; any other attached fields are recorded together under `fields`.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if let Sink::Aggregated(buffer) = &self.inner.sink {
            buffer.push_line(level.as_str(), message.to_string(), &self.inner.fields);
            return;
        }

        let request_id = self.field(REQUEST_ID_FIELD);
        let method = self.field(METHOD_FIELD);
        let path = self.field(PATH_FIELD);
        let extra = self.extra_fields();
        let extra = (!extra.is_empty()).then(|| tracing::field::debug(extra));

        macro_rules! emit {
            ($event:ident) => {
                tracing::$event!(
                    target: LOG_TARGET,
                    requestID = request_id,
                    method = method,
                    path = path,
                    fields = extra,
                    "{}",
                    message
                )
            };
        }

        match level {
            Level::TRACE => emit!(trace),
            Level::DEBUG => emit!(debug),
            Level::INFO => emit!(info),
            Level::WARN => emit!(warn),
            Level::ERROR => emit!(error),
        }
    }

    /// Log at TRACE level
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Level::TRACE, message);
    }

    /// Log at DEBUG level
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::DEBUG, message);
    }

    /// Log at INFO level
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::INFO, message);
    }

    /// Log at WARN level
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::WARN, message);
    }

    /// Log at ERROR level
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::ERROR, message);
    }

    /// Attached fields other than the well-known request fields
    fn extra_fields(&self) -> BTreeMap<&str, &str> {
        self.inner
            .fields
            .iter()
            .filter(|(key, _)| !WELL_KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("fields", &self.inner.fields)
            .field("aggregated", &self.is_aggregated())
            .finish()
    }
}
