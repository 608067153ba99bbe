//! Log signal configuration.
//!
//! Ambient code reaches this provider through the
//! `opentelemetry-appender-tracing` bridge rather than a global handle;
//! the pipeline wires that bridge when subscriber initialisation is
//! requested.

use crate::config::TlsConfig;
use crate::dsn::Dsn;
use crate::error::{PipelineError, Result};
use crate::signal::{self, BATCH_EXPORT_TIMEOUT};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{BatchConfigBuilder, BatchLogProcessor, SdkLoggerProvider};

/// Builds a logger provider exporting to the DSN endpoint.
pub(crate) fn configure(
    dsn: &Dsn,
    resource: Resource,
    tls: Option<&TlsConfig>,
) -> Result<SdkLoggerProvider> {
    let builder = opentelemetry_otlp::LogExporter::builder().with_http();
    let exporter = signal::apply_transport(builder, dsn, "/v1/logs", tls)?
        .build()
        .map_err(PipelineError::LogExporter)?;

    let queue_size = signal::batch_queue_size();
    let batch_config = BatchConfigBuilder::default()
        .with_max_queue_size(queue_size)
        .with_max_export_batch_size(queue_size)
        .with_scheduled_delay(BATCH_EXPORT_TIMEOUT)
        .build();

    let processor = BatchLogProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    Ok(SdkLoggerProvider::builder()
        .with_log_processor(processor)
        .with_resource(resource)
        .build())
}
