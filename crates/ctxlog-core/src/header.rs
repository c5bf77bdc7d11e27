//! Request annotations
//!
//! Call sites annotate a request with facts worth keeping without knowing how
//! the deployment collects logs. In aggregate mode the annotation lands in
//! the request buffer's header map; otherwise it is logged right away.

use crate::context::RequestContext;
use crate::logger::Sink;
use crate::store::get_logger;
use serde_json::Value;

/// Annotate the request with `name: value`
///
/// Aggregate mode: sets `name` in the request buffer's header (last write
/// wins) and emits nothing. Direct mode: logs one INFO line `"{name}: {value}"`
/// through the request's logger and buffers nothing.
pub fn set_header_field(ctx: &mut RequestContext, name: &str, value: impl Into<Value>) {
    let value = value.into();
    let logger = get_logger(ctx);

    if !ctx.is_aggregate() {
        logger.info(format_args!("{}: {}", name, render_value(&value)));
        return;
    }

    match logger.sink() {
        Sink::Aggregated(buffer) => buffer.set_header(name, value),
        // bound before the buffer was installed; the context's buffer is the one flushed
        Sink::Direct => {
            if let Some(buffer) = ctx.aggregate() {
                buffer.set_header(name, value);
            }
        }
    }
}

/// Human-readable rendering: strings unquoted, everything else as JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
