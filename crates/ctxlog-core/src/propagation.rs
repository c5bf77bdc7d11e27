//! Trace context propagation utilities
//!
//! Spans handed to the request context by tracing middleware only need to be
//! renderable as a string; [`TraceSpan`] captures that. [`TraceContext`] is the
//! concrete span value this crate knows how to parse from inbound headers.

use http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Jaeger propagation header, carried verbatim as a correlation id
pub const UBER_TRACE_ID_HEADER: &str = "uber-trace-id";

/// W3C Trace Context header name for traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A span value that can be rendered into a correlation id.
pub trait TraceSpan: fmt::Display + Send + Sync {}

impl<T: fmt::Display + Send + Sync> TraceSpan for T {}

/// Shared reference to a span stored in a request context
pub type SpanRef = Arc<dyn TraceSpan>;

/// Trace context information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceContext {
    /// Trace ID (hex encoded)
    pub trace_id: String,
    /// Span ID (hex encoded)
    pub span_id: String,
    /// Parent span ID - if this is a child span
    pub parent_span_id: Option<String>,
    /// Trace flags (8 bits)
    pub trace_flags: u8,
}

impl TraceContext {
    /// Create a new root trace context with generated IDs
    pub fn new() -> Self {
        Self {
            trace_id: Self::generate_trace_id(),
            span_id: Self::generate_span_id(),
            parent_span_id: None,
            trace_flags: 0x01,
        }
    }

    /// Create a child span context from a parent
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Self::generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            trace_flags: self.trace_flags,
        }
    }

    /// Generate a new trace ID (128-bit, 32 hex chars)
    pub fn generate_trace_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a new span ID (64-bit, 16 hex chars)
    pub fn generate_span_id() -> String {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        format!("{:016x}", high)
    }

    /// Check if trace is sampled
    pub fn is_sampled(&self) -> bool {
        self.trace_flags & 0x01 == 0x01
    }

    /// Wrap this context for storage in a request context
    pub fn into_span_ref(self) -> SpanRef {
        Arc::new(self)
    }

    /// Format as W3C traceparent header value
    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{}-{}-{:02x}",
            self.trace_id, self.span_id, self.trace_flags
        )
    }

    /// Parse from W3C traceparent header value
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if parts.len() != 4 {
            return None;
        }

        if parts[0] != "00" {
            return None; // Only version 00 is supported
        }

        let (trace_id, span_id, flags) = (parts[1], parts[2], parts[3]);
        if trace_id.len() != 32 || span_id.len() != 16 || flags.len() != 2 {
            return None;
        }
        if !is_hex(trace_id) || !is_hex(span_id) || !is_hex(flags) {
            return None;
        }

        let trace_flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: span_id.to_ascii_lowercase(),
            parent_span_id: None,
            trace_flags,
        })
    }

    /// Parse from a Jaeger `uber-trace-id` value (`trace:span:parent:flags`)
    pub fn from_uber_trace_id(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        if parts.len() != 4 {
            return None;
        }

        let (trace_id, span_id, parent, flags) = (parts[0], parts[1], parts[2], parts[3]);
        if trace_id.is_empty() || trace_id.len() > 32 || !is_hex(trace_id) {
            return None;
        }
        if span_id.is_empty() || span_id.len() > 16 || !is_hex(span_id) {
            return None;
        }
        if parent.is_empty() || !is_hex(parent) {
            return None;
        }
        if flags.is_empty() || !is_hex(flags) {
            return None;
        }

        let trace_flags = u8::from_str_radix(flags, 16).ok()?;
        let parent_span_id = match parent.trim_start_matches('0') {
            "" => None,
            _ => Some(parent.to_ascii_lowercase()),
        };

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: span_id.to_ascii_lowercase(),
            parent_span_id,
            trace_flags,
        })
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the Jaeger propagation form, which is what ends up as the
/// correlation id when this span is found in a request context.
impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{:x}",
            self.trace_id,
            self.span_id,
            self.parent_span_id.as_deref().unwrap_or("0"),
            self.trace_flags
        )
    }
}

/// Extract a W3C trace context from inbound request headers
pub fn extract_trace_context(headers: &HeaderMap) -> Option<TraceContext> {
    headers
        .get(TRACEPARENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(TraceContext::from_traceparent)
}

fn is_hex(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit())
}
