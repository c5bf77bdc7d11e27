//! Per-request logging context
//!
//! `RequestContext` holds everything the logging core memoizes for a single
//! request: the correlation id, the bound logger, the aggregate buffer (when
//! aggregate mode is on) and any spans tracing middleware left behind. It is
//! owned by one request and travels in the request's `Extensions`.

use crate::buffer::LogBuffer;
use crate::logger::Logger;
use crate::propagation::SpanRef;
use crate::request::Request;
use http::{request::Parts, HeaderMap, Method};
use std::collections::HashMap;
use std::sync::Arc;

/// Key under which tracing middleware stores the active span
pub const TRACING_CONTEXT_KEY: &str = "tracing-context";

/// Typed request-scoped context for logging
#[derive(Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    pub(crate) request_id: Option<String>,
    pub(crate) logger: Option<Logger>,
    aggregate: Option<Arc<LogBuffer>>,
    spans: HashMap<String, SpanRef>,
    trace_id_field: Option<String>,
}

impl RequestContext {
    /// Create a context from the request head
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            request_id: None,
            logger: None,
            aggregate: None,
            spans: HashMap::new(),
            trace_id_field: None,
        }
    }

    /// Create a context from `http` request parts
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.path(), parts.headers.clone())
    }

    /// Set the secondary key consulted for a span when none is stored
    /// under [`TRACING_CONTEXT_KEY`]
    pub fn with_trace_id_field(mut self, field: impl Into<String>) -> Self {
        self.set_trace_id_field(Some(field.into()));
        self
    }

    /// Put the request in aggregate mode
    pub fn with_aggregate(mut self, buffer: Arc<LogBuffer>) -> Self {
        self.set_aggregate(buffer);
        self
    }

    /// Store a span under `key`
    pub fn with_span(mut self, key: impl Into<String>, span: SpanRef) -> Self {
        self.set_span(key, span);
        self
    }

    /// HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Inbound request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Store a span under `key`, replacing any previous one
    pub fn set_span(&mut self, key: impl Into<String>, span: SpanRef) {
        self.spans.insert(key.into(), span);
    }

    /// Span stored under `key`
    pub fn span(&self, key: &str) -> Option<&SpanRef> {
        self.spans.get(key)
    }

    /// Set or clear the secondary span key; an empty name disables it
    pub fn set_trace_id_field(&mut self, field: Option<String>) {
        self.trace_id_field = field.filter(|f| !f.is_empty());
    }

    /// The secondary span key, if configured
    pub fn trace_id_field(&self) -> Option<&str> {
        self.trace_id_field.as_deref()
    }

    /// Install the per-request aggregate buffer
    pub fn set_aggregate(&mut self, buffer: Arc<LogBuffer>) {
        self.aggregate = Some(buffer);
    }

    /// The per-request aggregate buffer, if in aggregate mode
    pub fn aggregate(&self) -> Option<&Arc<LogBuffer>> {
        self.aggregate.as_ref()
    }

    /// Whether an aggregate sink was configured for this request
    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }

    /// The memoized correlation id, without computing one
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The bound logger, without creating one
    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("request_id", &self.request_id)
            .field("aggregate", &self.aggregate.is_some())
            .field("spans", &self.spans.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Access to the [`RequestContext`] stored in a request's extensions
pub trait RequestContextExt {
    /// The context, if one has been created
    fn log_context(&self) -> Option<&RequestContext>;

    /// The context, created from the request head on first use
    fn log_context_mut(&mut self) -> &mut RequestContext;
}

impl RequestContextExt for Request {
    fn log_context(&self) -> Option<&RequestContext> {
        self.parts.extensions.get::<RequestContext>()
    }

    fn log_context_mut(&mut self) -> &mut RequestContext {
        let Parts {
            method,
            uri,
            headers,
            extensions,
            ..
        } = &mut self.parts;
        extensions.get_or_insert_with(|| RequestContext::new(method.clone(), uri.path(), headers.clone()))
    }
}
