//! Error and panic reporting.
//!
//! These helpers attach exception telemetry to whatever span is current.
//! When no span is recording they host the event on a short-lived
//! `__dummy__` placeholder span so the report still reaches the backend
//! with full resource attribution.

use crate::pipeline::{TelemetryPipeline, active};
use opentelemetry::Context;
use opentelemetry::KeyValue;
use opentelemetry::trace::{Span, Tracer};
use opentelemetry_semantic_conventions::trace::EXCEPTION_STACKTRACE;
use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error;

/// Span name used when no caller span is available to host a report.
const PLACEHOLDER_SPAN: &str = "__dummy__";

/// Maximum bytes of backtrace text attached to a panic report.
const MAX_STACKTRACE_BYTES: usize = 2048;

/// Reports `error` against the active pipeline and hands it back, so the
/// call slots into an error path without disturbing the flow:
///
/// ```ignore
/// return Err(report_error(&Context::current(), error));
/// ```
///
/// No-op when no pipeline is installed.
pub fn report_error<'a>(
    cx: &Context,
    error: &'a (dyn Error + 'static),
) -> &'a (dyn Error + 'static) {
    if let Some(pipeline) = active() {
        pipeline.report_error(cx, error);
    }
    error
}

/// Reports a panic payload against the active pipeline.
///
/// Intended for use from a panic hook; no-op when no pipeline is
/// installed.
pub fn report_panic(cx: &Context, payload: &(dyn Any + Send)) {
    if let Some(pipeline) = active() {
        pipeline.report_panic(cx, payload);
    }
}

impl TelemetryPipeline {
    /// Records `error` as an exception event on the context's span, or on
    /// an immediately ended placeholder span when nothing is recording.
    pub fn report_error(&self, cx: &Context, error: &(dyn Error + 'static)) {
        use opentelemetry::trace::TraceContextExt;

        let span = cx.span();
        if span.is_recording() {
            span.record_error(error);
            return;
        }

        let Some(tracer) = self.tracer() else {
            return;
        };
        let mut span = tracer.start_with_context(PLACEHOLDER_SPAN, cx);
        span.record_error(error);
        span.end();
    }

    /// Records a panic as a `log` event carrying the panic message and a
    /// truncated backtrace, then synchronously flushes the trace provider.
    ///
    /// The flush is deliberate: a panicking process is usually about to
    /// die, and a batched span that never leaves the queue reports
    /// nothing.
    pub fn report_panic(&self, cx: &Context, payload: &(dyn Any + Send)) {
        use opentelemetry::trace::TraceContextExt;

        let attributes = vec![
            KeyValue::new("log.severity", "panic"),
            KeyValue::new("log.message", panic_message(payload)),
            KeyValue::new(EXCEPTION_STACKTRACE, capture_stacktrace()),
        ];

        let span = cx.span();
        if span.is_recording() {
            span.add_event("log", attributes);
        } else if let Some(tracer) = self.tracer() {
            let mut span = tracer.start_with_context(PLACEHOLDER_SPAN, cx);
            span.add_event("log", attributes);
            span.end();
        } else {
            return;
        }

        if let Some(provider) = self.trace_provider()
            && let Err(error) = provider.force_flush()
        {
            tracing::warn!(error = %error, "trace flush after panic report failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_owned()
    }
}

fn capture_stacktrace() -> String {
    let mut stack = Backtrace::force_capture().to_string();
    if stack.len() > MAX_STACKTRACE_BYTES {
        let mut end = MAX_STACKTRACE_BYTES;
        while !stack.is_char_boundary(end) {
            end -= 1;
        }
        stack.truncate(end);
    }
    stack
}
