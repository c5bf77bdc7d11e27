//! Binding a logger to a request

use crate::context::RequestContext;
use crate::logger::{Logger, Sink, METHOD_FIELD, PATH_FIELD, REQUEST_ID_FIELD};
use crate::request_id::resolve_request_id;

/// Establish the logger for this request and store it on the context
///
/// In aggregate mode the returned logger keeps `base`'s fields but writes
/// into the request's aggregate buffer, and no per-request fields are added:
/// the aggregate consumer identifies the request from the buffer itself.
/// Otherwise the logger writes directly, even when `base` was aggregated,
/// and carries `requestID`, `method` and `path` on every line.
///
/// Any previously bound logger is replaced.
pub fn bind_logger(ctx: &mut RequestContext, base: &Logger) -> Logger {
    let logger = derive_logger(ctx, base);
    ctx.logger = Some(logger.clone());
    logger
}

fn derive_logger(ctx: &mut RequestContext, base: &Logger) -> Logger {
    if let Some(buffer) = ctx.aggregate().cloned() {
        return base.with_sink(Sink::Aggregated(buffer));
    }

    let request_id = resolve_request_id(ctx);
    base.with_sink(Sink::Direct).with_fields([
        (REQUEST_ID_FIELD, request_id),
        (METHOD_FIELD, ctx.method().to_string()),
        (PATH_FIELD, ctx.path().to_string()),
    ])
}
