//! Error types for pipeline construction and lifecycle operations.

use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

/// A specialised Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or driving the telemetry pipeline.
///
/// Only [`PipelineError::InvalidDsn`] is surfaced at construction time; a
/// failure scoped to a single signal is logged and leaves that signal's
/// provider absent without affecting the other signals.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The backend connection descriptor could not be parsed.
    #[error("invalid DSN {dsn:?}: {reason}")]
    InvalidDsn {
        /// The descriptor that failed to parse.
        dsn: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The span exporter could not be built.
    #[error("failed to build span exporter")]
    TraceExporter(#[source] ExporterBuildError),

    /// The metric exporter could not be built.
    #[error("failed to build metric exporter")]
    MetricExporter(#[source] ExporterBuildError),

    /// The log exporter could not be built.
    #[error("failed to build log exporter")]
    LogExporter(#[source] ExporterBuildError),

    /// A TLS-configured HTTP client could not be constructed.
    #[error("failed to build TLS HTTP client")]
    HttpClient(#[from] reqwest::Error),

    /// A provider failed to flush buffered telemetry.
    #[error("flush failed")]
    Flush(#[source] OTelSdkError),

    /// Tracing subscriber initialisation failed.
    #[error("failed to initialise tracing subscriber")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}

impl PipelineError {
    pub(crate) fn invalid_dsn(dsn: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::InvalidDsn {
            dsn: dsn.into(),
            reason: reason.into(),
        }
    }
}
