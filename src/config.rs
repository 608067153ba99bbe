//! Programmatic configuration surface for the telemetry pipeline.
//!
//! Hosts bind their own flag/file loading and feed the result in here; the
//! builder only captures the knobs the pipeline itself understands.

use crate::error::Result;
use crate::pipeline::{self, TelemetryPipeline};
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::ResourceDetector;
use opentelemetry_sdk::trace::Sampler;
use std::sync::Arc;

/// TLS settings for the exporter HTTP client.
///
/// Only needed when the backend presents a certificate the system trust
/// store does not cover; a plain `http` DSN needs no TLS machinery at all.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Additional root certificate in PEM form, trusted for the backend.
    pub ca_certificate_pem: Option<Vec<u8>>,
    /// Skip server certificate verification. For test setups only.
    pub accept_invalid_certs: bool,
}

pub(crate) struct PipelineConfig {
    pub dsn: Option<String>,
    pub traces_enabled: bool,
    pub metrics_enabled: bool,
    pub logs_enabled: bool,
    pub service_name: Option<String>,
    pub resource_attributes: Vec<KeyValue>,
    pub resource_detectors: Vec<Box<dyn ResourceDetector>>,
    pub resource_override: Option<Resource>,
    pub tls: Option<TlsConfig>,
    pub pretty_print: bool,
    pub sampler: Option<Sampler>,
    pub propagator: Option<Box<dyn TextMapPropagator + Send + Sync>>,
    pub init_tracing_subscriber: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            traces_enabled: true,
            metrics_enabled: true,
            logs_enabled: true,
            service_name: None,
            resource_attributes: Vec::new(),
            resource_detectors: Vec::new(),
            resource_override: None,
            tls: None,
            pretty_print: false,
            sampler: None,
            propagator: None,
            init_tracing_subscriber: false,
        }
    }
}

/// Builder for a [`TelemetryPipeline`].
///
/// # Example
///
/// ```no_run
/// use otlp_bootstrap::PipelineBuilder;
///
/// let pipeline = PipelineBuilder::new()
///     .dsn("https://token@otel.example.com/1")
///     .service_name("my-service")
///     .install()
///     .expect("telemetry setup");
/// ```
#[must_use = "builders do nothing unless .install() is called"]
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Creates a builder with all three signals enabled and no DSN.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend connection descriptor. Without one the pipeline is
    /// installed disabled and every helper call is a no-op.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        let dsn = dsn.into();
        self.config.dsn = (!dsn.is_empty()).then_some(dsn);
        self
    }

    /// Enables or disables the trace signal.
    pub fn traces(mut self, enabled: bool) -> Self {
        self.config.traces_enabled = enabled;
        self
    }

    /// Enables or disables the metric signal.
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.config.metrics_enabled = enabled;
        self
    }

    /// Enables or disables the log signal.
    pub fn logs(mut self, enabled: bool) -> Self {
        self.config.logs_enabled = enabled;
        self
    }

    /// Sets the `service.name` resource attribute.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = Some(name.into());
        self
    }

    /// Adds explicit resource attributes, taking precedence over detected ones.
    pub fn resource_attributes<T: IntoIterator<Item = KeyValue>>(mut self, attributes: T) -> Self {
        self.config.resource_attributes.extend(attributes);
        self
    }

    /// Adds a custom resource detector, run after the built-in ones.
    pub fn resource_detector(mut self, detector: Box<dyn ResourceDetector>) -> Self {
        self.config.resource_detectors.push(detector);
        self
    }

    /// Replaces the built resource entirely. Any configured attributes or
    /// detectors are discarded with a warning.
    pub fn resource_override(mut self, resource: Resource) -> Self {
        self.config.resource_override = Some(resource);
        self
    }

    /// Supplies TLS settings for the exporter HTTP client.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.config.tls = Some(tls);
        self
    }

    /// Additionally pretty-prints finished spans to stdout. The primary
    /// batching export is unaffected.
    pub fn pretty_print(mut self, enabled: bool) -> Self {
        self.config.pretty_print = enabled;
        self
    }

    /// Overrides the default sampler of the tracer provider.
    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.config.sampler = Some(sampler);
        self
    }

    /// Overrides the globally installed text map propagator. The default is
    /// a W3C trace-context plus baggage composite.
    pub fn propagator<P>(mut self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        self.config.propagator = Some(Box::new(propagator));
        self
    }

    /// Also initialises a `tracing` subscriber wired to the pipeline (fmt
    /// layer, `RUST_LOG` filtering, OpenTelemetry span and log bridges).
    /// Leave off when the host owns its own subscriber.
    pub fn init_tracing_subscriber(mut self, enabled: bool) -> Self {
        self.config.init_tracing_subscriber = enabled;
        self
    }

    /// Builds the pipeline, publishes it as the process-wide active
    /// instance, and configures every enabled signal.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDsn`](crate::PipelineError::InvalidDsn)
    /// when a DSN is configured but malformed; per-signal configuration
    /// failures are logged and leave that signal disabled instead.
    pub fn install(self) -> Result<Arc<TelemetryPipeline>> {
        pipeline::install(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dsn_counts_as_absent() {
        let builder = PipelineBuilder::new().dsn("");
        assert!(builder.config.dsn.is_none());
    }

    #[test]
    fn defaults_enable_all_signals() {
        let config = PipelineConfig::default();

        assert!(config.traces_enabled);
        assert!(config.metrics_enabled);
        assert!(config.logs_enabled);
        assert!(!config.pretty_print);
        assert!(!config.init_tracing_subscriber);
    }
}
