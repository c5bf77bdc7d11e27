//! # ctxlog core
//!
//! Request-scoped logging context for HTTP services.
//!
//! Every request gets one correlation id, resolved once from the strongest
//! source available (tracing span, `uber-trace-id` header, or a fresh UUID),
//! and one logger handle that every code path handling the request shares.
//! In aggregate mode the handle writes into a per-request buffer instead of
//! the shared log stream, and header annotations are collected separately.
//!
//! This crate is not meant to be used directly. Use `ctxlog` instead.

mod binder;
mod buffer;
mod config;
mod context;
mod error;
mod header;
mod logger;
pub mod middleware;
pub mod propagation;
mod request;
mod request_id;
mod response;
mod store;
#[cfg(test)]
mod test_support;

// Public API
pub use binder::bind_logger;
pub use buffer::{
    AggregateRecord, AggregateSink, BufferedLine, LogBuffer, MemorySink, TracingSink, AGGREGATE_TARGET,
};
pub use config::{load_dotenv, load_dotenv_from, ContextLoggerConfig, ContextLoggerConfigBuilder};
pub use context::{RequestContext, RequestContextExt, TRACING_CONTEXT_KEY};
pub use error::ConfigError;
pub use header::set_header_field;
pub use logger::{
    Logger, Sink, LOG_TARGET, METHOD_FIELD, PATH_FIELD, REQUEST_ID_FIELD, UNKNOWN_REQUEST_ID,
};
pub use middleware::{ContextLoggerLayer, Handler, ResponseFuture};
pub use propagation::{SpanRef, TraceContext, TraceSpan};
pub use request::Request;
pub use request_id::resolve_request_id;
pub use response::Response;
pub use store::{get_cached_request_id, get_logger};
