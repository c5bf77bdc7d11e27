//! Request context logging middleware
//!
//! Binds a logger to every request before the handler runs. With an aggregate
//! sink configured, each request gets a fresh [`LogBuffer`] that is flushed to
//! the sink once the response is ready.
//!
//! # Example
//!
//! ```rust,ignore
//! use ctxlog_core::{ContextLoggerLayer, MemorySink};
//!
//! let service = ContextLoggerLayer::new()
//!     .aggregate(Arc::new(MemorySink::new()))
//!     .wrap(handler);
//! ```

use super::{Handler, ResponseFuture};
use crate::binder::bind_logger;
use crate::buffer::{AggregateSink, LogBuffer};
use crate::config::ContextLoggerConfig;
use crate::context::{RequestContextExt, TRACING_CONTEXT_KEY};
use crate::logger::{Logger, METHOD_FIELD, PATH_FIELD, REQUEST_ID_FIELD};
use crate::propagation::extract_trace_context;
use crate::request::Request;
use crate::request_id::resolve_request_id;
use http::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Instant;

/// Middleware layer that binds a request-scoped logger
#[derive(Clone)]
pub struct ContextLoggerLayer {
    config: ContextLoggerConfig,
    base: Logger,
    aggregate: Option<Arc<dyn AggregateSink>>,
    response_header: Option<HeaderName>,
}

impl ContextLoggerLayer {
    /// Create a layer with the default configuration
    pub fn new() -> Self {
        Self::with_config(ContextLoggerConfig::default())
    }

    /// Create a layer with a custom configuration
    ///
    /// An invalid `response_header` name is dropped with a warning.
    pub fn with_config(config: ContextLoggerConfig) -> Self {
        let response_header = config.response_header.as_deref().and_then(|name| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| {
                    tracing::warn!(header = %name, error = %err, "ignoring invalid response header name")
                })
                .ok()
        });

        Self {
            config,
            base: Logger::new(),
            aggregate: None,
            response_header,
        }
    }

    /// Logger every request logger is derived from
    pub fn base_logger(mut self, logger: Logger) -> Self {
        self.base = logger;
        self
    }

    /// Funnel every request through a shared aggregate sink
    pub fn aggregate(mut self, sink: Arc<dyn AggregateSink>) -> Self {
        self.aggregate = Some(sink);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ContextLoggerConfig {
        &self.config
    }

    /// Wrap `handler` so every request it receives runs through this layer
    pub fn wrap(self, handler: Handler) -> Handler {
        let layer = Arc::new(self);
        Arc::new(move |req: Request| layer.call(req, handler.clone()))
    }

    /// Run one request through the layer, calling `next` for the response
    pub fn call(&self, mut req: Request, next: Handler) -> ResponseFuture {
        let ctx = req.log_context_mut();

        if let Some(field) = &self.config.trace_id_field {
            ctx.set_trace_id_field(Some(field.clone()));
        }
        if self.config.extract_traceparent && ctx.span(TRACING_CONTEXT_KEY).is_none() {
            if let Some(trace) = extract_trace_context(ctx.headers()) {
                ctx.set_span(TRACING_CONTEXT_KEY, trace.into_span_ref());
            }
        }

        let buffer = self.aggregate.as_ref().map(|sink| {
            let buffer = Arc::new(LogBuffer::new(sink.clone()));
            ctx.set_aggregate(buffer.clone());
            buffer
        });

        let logger = bind_logger(ctx, &self.base);
        let request_id = resolve_request_id(ctx);

        // the aggregate consumer identifies the request from the header
        if let Some(buffer) = &buffer {
            buffer.set_header(REQUEST_ID_FIELD, request_id.clone());
            buffer.set_header(METHOD_FIELD, ctx.method().as_str());
            buffer.set_header(PATH_FIELD, ctx.path());
        }

        let log_lines = self.config.log_requests && !self.config.is_skipped(ctx.path());
        let response_header = self.response_header.clone();

        Box::pin(async move {
            let start = Instant::now();
            if log_lines {
                logger.info("request started");
            }

            let mut response = next(req).await;

            let status = response.status();
            let duration_ms = start.elapsed().as_millis() as u64;

            if log_lines {
                if status.is_client_error() || status.is_server_error() {
                    logger.warn(format_args!(
                        "request failed status={} duration_ms={}",
                        status.as_u16(),
                        duration_ms
                    ));
                } else {
                    logger.info(format_args!(
                        "request completed status={} duration_ms={}",
                        status.as_u16(),
                        duration_ms
                    ));
                }
            }

            if let Some(name) = response_header {
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response.headers_mut().insert(name, value);
                }
            }

            if let Some(buffer) = buffer {
                buffer.set_header("status", status.as_u16());
                buffer.set_header("duration_ms", duration_ms);
                buffer.flush();
            }

            response
        })
    }
}

impl Default for ContextLoggerLayer {
    fn default() -> Self {
        Self::new()
    }
}
