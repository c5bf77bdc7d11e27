//! Correlation id resolution
//!
//! The first call for a request walks the sources below in order and stops at
//! the first hit. The winner is stored on the context, so every later call in
//! the same request returns the identical string.
//!
//! 1. the id already memoized on the context
//! 2. the span under [`TRACING_CONTEXT_KEY`]
//! 3. the span under the context's configured secondary key
//! 4. the inbound `uber-trace-id` header, verbatim
//! 5. a fresh UUID v4

use crate::context::{RequestContext, TRACING_CONTEXT_KEY};
use crate::propagation::UBER_TRACE_ID_HEADER;
use uuid::Uuid;

/// Get the correlation id for this request, computing it on first use
pub fn resolve_request_id(ctx: &mut RequestContext) -> String {
    if let Some(id) = &ctx.request_id {
        return id.clone();
    }

    let request_id = span_request_id(ctx)
        .or_else(|| header_request_id(ctx))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ctx.request_id = Some(request_id.clone());
    request_id
}

fn span_request_id(ctx: &RequestContext) -> Option<String> {
    if let Some(span) = ctx.span(TRACING_CONTEXT_KEY) {
        return Some(span.to_string());
    }

    ctx.trace_id_field()
        .and_then(|field| ctx.span(field))
        .map(|span| span.to_string())
}

fn header_request_id(ctx: &RequestContext) -> Option<String> {
    ctx.headers()
        .get(UBER_TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
