//! # ctxlog
//!
//! Request-scoped structured logging for HTTP services.
//!
//! Each request gets a correlation id that never changes once computed and a
//! logger handle shared by every code path handling that request. The id is
//! taken from an upstream tracing span or the `uber-trace-id` header when one
//! exists, and generated otherwise.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ctxlog::prelude::*;
//!
//! ctxlog::init_tracing();
//!
//! let service = ContextLoggerLayer::new().wrap(handler);
//! let response = service(request).await;
//!
//! // inside a handler
//! let ctx = req.log_context_mut();
//! set_header_field(ctx, "user_id", 42);
//! get_logger(ctx).info("loaded user");
//! ```
//!
//! ## Aggregate mode
//!
//! Give the layer an [`AggregateSink`] and every request's lines and header
//! annotations are collected in a [`LogBuffer`] and handed to the sink as one
//! [`AggregateRecord`] when the request completes, instead of interleaving
//! with other requests on the shared stream.

pub use ctxlog_core::*;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a `tracing` subscriber reading `RUST_LOG`, if none is set yet
///
/// Falls back to `info,ctxlog=debug` when `RUST_LOG` is unset or invalid.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ctxlog=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Prelude module - import everything you need
pub mod prelude {
    pub use ctxlog_core::{
        bind_logger, get_cached_request_id, get_logger, resolve_request_id, set_header_field,
        AggregateSink, ContextLoggerConfig, ContextLoggerLayer, Handler, Logger, MemorySink,
        Request, RequestContext, RequestContextExt, Response, ResponseFuture, TraceContext,
        TracingSink,
    };

    pub use serde_json::json;
    pub use tracing::Level;
}
