//! Trace signal configuration.

use crate::config::TlsConfig;
use crate::dsn::Dsn;
use crate::error::{PipelineError, Result};
use crate::id_generator::TimeBiasedIdGenerator;
use crate::signal::{self, BATCH_EXPORT_TIMEOUT};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{
    BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider,
};

/// Builds a tracer provider exporting to the DSN endpoint.
///
/// The provider uses the time-biased ID generator, a batch span processor
/// sized from host parallelism, and optionally a stdout pretty-print
/// processor in addition to the batching one.
pub(crate) fn configure(
    dsn: &Dsn,
    resource: Resource,
    tls: Option<&TlsConfig>,
    sampler: Option<Sampler>,
    pretty_print: bool,
) -> Result<SdkTracerProvider> {
    let builder = opentelemetry_otlp::SpanExporter::builder().with_http();
    let exporter = signal::apply_transport(builder, dsn, "/v1/traces", tls)?
        .build()
        .map_err(PipelineError::TraceExporter)?;

    let queue_size = signal::batch_queue_size();
    let batch_config = BatchConfigBuilder::default()
        .with_max_queue_size(queue_size)
        .with_max_export_batch_size(queue_size)
        .with_scheduled_delay(BATCH_EXPORT_TIMEOUT)
        .build();

    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    let mut builder = SdkTracerProvider::builder()
        .with_id_generator(TimeBiasedIdGenerator::new())
        .with_resource(resource)
        .with_span_processor(processor);

    if let Some(sampler) = sampler {
        builder = builder.with_sampler(sampler);
    }

    if pretty_print {
        builder = builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    Ok(builder.build())
}
