//! Middleware for ctxlog
//!
//! [`ContextLoggerLayer`] binds the request logger before the handler runs and
//! flushes aggregate buffers after.
//!
//! # Example
//!
//! ```rust,ignore
//! use ctxlog_core::middleware::ContextLoggerLayer;
//!
//! let service = ContextLoggerLayer::new().wrap(handler);
//! let response = service(request).await;
//! ```

mod context_layer;

use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future resolving to a handler's response
pub type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A request handler, possibly already wrapped in middleware
pub type Handler = Arc<dyn Fn(Request) -> ResponseFuture + Send + Sync>;

pub use context_layer::ContextLoggerLayer;
