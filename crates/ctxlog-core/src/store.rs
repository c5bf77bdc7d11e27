//! Reading the request's logger

use crate::binder::bind_logger;
use crate::context::RequestContext;
use crate::logger::{Logger, REQUEST_ID_FIELD, UNKNOWN_REQUEST_ID};

/// Get the logger bound to this request
///
/// When nothing has been bound yet a default logger is bound on the spot, so
/// code running before the middleware still gets a usable handle. Every call
/// after the first returns the same handle.
pub fn get_logger(ctx: &mut RequestContext) -> Logger {
    if let Some(logger) = &ctx.logger {
        return logger.clone();
    }
    bind_logger(ctx, &Logger::new())
}

/// Read the correlation id attached to the bound logger
///
/// Never computes one: returns `"unknown"` when no logger is bound or the
/// bound logger carries no `requestID` field (as in aggregate mode).
pub fn get_cached_request_id(ctx: &RequestContext) -> String {
    ctx.logger()
        .and_then(|logger| logger.field(REQUEST_ID_FIELD))
        .unwrap_or(UNKNOWN_REQUEST_ID)
        .to_string()
}
