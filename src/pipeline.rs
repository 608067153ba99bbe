//! Telemetry pipeline lifecycle management.
//!
//! The [`TelemetryPipeline`] owns the three signal providers and
//! coordinates setup, flush, and shutdown across them. One instance per
//! process is published as the *active instance*, an atomically written
//! reference the free helper functions read without locking. The reference
//! has exactly one writer, [`PipelineBuilder::install`](crate::PipelineBuilder::install);
//! it exists so call sites that cannot carry a pipeline handle (panic
//! hooks, deep error paths) can still reach telemetry. Prefer passing the
//! handle explicitly where you can.

use crate::config::PipelineConfig;
use crate::dsn::Dsn;
use crate::error::{PipelineError, Result};
use crate::resource::build_resource;
use crate::signal;
use arc_swap::ArcSwapOption;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanContext, TracerProvider as _};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) const INSTRUMENTATION_SCOPE: &str = "otlp-bootstrap";

static ACTIVE: ArcSwapOption<TelemetryPipeline> = ArcSwapOption::const_empty();

/// Returns the process-wide active pipeline, if one was installed.
pub fn active() -> Option<Arc<TelemetryPipeline>> {
    ACTIVE.load_full()
}

/// Flushes the active pipeline. No-op without one.
///
/// # Errors
///
/// Returns the last flush error encountered across the providers.
pub fn force_flush() -> Result<()> {
    match active() {
        Some(pipeline) => pipeline.force_flush(),
        None => Ok(()),
    }
}

/// The telemetry pipeline: three independently optional signal providers
/// sharing one DSN-derived transport.
///
/// A provider slot is populated only when its signal is enabled and its
/// exporter built without error; every lifecycle operation skips absent
/// slots. All slots sit behind one lock so a flush racing a close
/// serialises instead of touching a provider mid-shutdown.
#[derive(Debug)]
pub struct TelemetryPipeline {
    dsn: Option<Dsn>,
    signals: Mutex<Signals>,
}

#[derive(Debug, Default)]
struct Signals {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
    logger: Option<SdkLoggerProvider>,
}

pub(crate) fn install(mut config: PipelineConfig) -> Result<Arc<TelemetryPipeline>> {
    let dsn = match config.dsn.take() {
        // A malformed descriptor is the one loud construction failure:
        // without it no signal can function, so the operator hears about
        // it at startup instead of losing telemetry silently.
        Some(raw) => Some(Dsn::parse(&raw)?),
        None => None,
    };

    let pipeline = Arc::new(TelemetryPipeline {
        dsn,
        signals: Mutex::new(Signals::default()),
    });

    // Publish before configuring signals so helper functions resolve the
    // instance for the whole pipeline lifetime.
    ACTIVE.store(Some(Arc::clone(&pipeline)));

    pipeline.setup(config)?;

    Ok(pipeline)
}

impl TelemetryPipeline {
    fn setup(&self, mut config: PipelineConfig) -> Result<()> {
        let Some(dsn) = &self.dsn else {
            return Ok(());
        };

        let resource = build_resource(&mut config);
        install_propagator(config.propagator.take());

        let tls = config.tls.as_ref();
        let mut signals = self.lock_signals();

        if config.traces_enabled {
            match signal::trace::configure(
                dsn,
                resource.clone(),
                tls,
                config.sampler.take(),
                config.pretty_print,
            ) {
                Ok(provider) => {
                    opentelemetry::global::set_tracer_provider(provider.clone());
                    signals.tracer = Some(provider);
                }
                Err(error) => {
                    tracing::error!(error = %error, "trace signal configuration failed");
                }
            }
        }

        if config.metrics_enabled {
            match signal::metrics::configure(dsn, resource.clone(), tls) {
                Ok(provider) => {
                    opentelemetry::global::set_meter_provider(provider.clone());
                    signals.meter = Some(provider);
                }
                Err(error) => {
                    tracing::error!(error = %error, "metric signal configuration failed");
                }
            }
        }

        if config.logs_enabled {
            match signal::logs::configure(dsn, resource, tls) {
                Ok(provider) => signals.logger = Some(provider),
                Err(error) => {
                    tracing::error!(error = %error, "log signal configuration failed");
                }
            }
        }

        if config.init_tracing_subscriber {
            init_subscriber(&signals.tracer, &signals.logger)?;
        }

        Ok(())
    }

    /// Whether a DSN was configured. A disabled pipeline still accepts
    /// every lifecycle and reporting call as a no-op.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }

    /// The parsed connection descriptor, when telemetry is enabled.
    pub fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    /// Link to the backend UI for the given span.
    pub fn trace_url(&self, span_context: &SpanContext) -> Option<String> {
        self.dsn.as_ref().map(|dsn| {
            format!(
                "{}/traces/{}?span_id={}",
                dsn.site_url(),
                span_context.trace_id(),
                span_context.span_id()
            )
        })
    }

    /// Flushes buffered telemetry from every present provider.
    ///
    /// Every provider is attempted regardless of earlier failures to get
    /// the best possible delivery at shutdown.
    ///
    /// # Errors
    ///
    /// Returns the last flush error encountered.
    pub fn force_flush(&self) -> Result<()> {
        let signals = self.lock_signals();
        let mut last_error = None;

        if let Some(provider) = &signals.tracer
            && let Err(error) = provider.force_flush()
        {
            last_error = Some(error);
        }
        if let Some(provider) = &signals.meter
            && let Err(error) = provider.force_flush()
        {
            last_error = Some(error);
        }
        if let Some(provider) = &signals.logger
            && let Err(error) = provider.force_flush()
        {
            last_error = Some(error);
        }

        match last_error {
            Some(error) => Err(PipelineError::Flush(error)),
            None => Ok(()),
        }
    }

    /// Shuts down every present provider, in trace, metric, log order.
    ///
    /// Each slot is cleared before its provider shuts down, so a second
    /// `close` (or a flush racing one) finds nothing to touch. Shutdown
    /// errors are logged rather than propagated; telemetry must never take
    /// the host down with it.
    pub fn close(&self) {
        let mut signals = self.lock_signals();

        if let Some(provider) = signals.tracer.take()
            && let Err(error) = provider.shutdown()
        {
            tracing::warn!(error = %error, "tracer provider shutdown failed");
        }
        if let Some(provider) = signals.meter.take()
            && let Err(error) = provider.shutdown()
        {
            tracing::warn!(error = %error, "meter provider shutdown failed");
        }
        if let Some(provider) = signals.logger.take()
            && let Err(error) = provider.shutdown()
        {
            tracing::warn!(error = %error, "logger provider shutdown failed");
        }
    }

    pub(crate) fn tracer(&self) -> Option<SdkTracer> {
        self.lock_signals()
            .tracer
            .as_ref()
            .map(|provider| provider.tracer(INSTRUMENTATION_SCOPE))
    }

    pub(crate) fn trace_provider(&self) -> Option<SdkTracerProvider> {
        self.lock_signals().tracer.clone()
    }

    fn lock_signals(&self) -> std::sync::MutexGuard<'_, Signals> {
        self.signals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn with_tracer_provider(provider: SdkTracerProvider) -> Self {
        TelemetryPipeline {
            dsn: None,
            signals: Mutex::new(Signals {
                tracer: Some(provider),
                ..Signals::default()
            }),
        }
    }
}

fn install_propagator(custom: Option<Box<dyn TextMapPropagator + Send + Sync>>) {
    let propagator = match custom {
        Some(custom) => TextMapCompositePropagator::new(vec![custom]),
        None => TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]),
    };
    opentelemetry::global::set_text_map_propagator(propagator);
}

fn init_subscriber(
    tracer_provider: &Option<SdkTracerProvider>,
    logger_provider: &Option<SdkLoggerProvider>,
) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    match (tracer_provider, logger_provider) {
        (Some(tp), Some(lp)) => {
            let tracer = tp.tracer(INSTRUMENTATION_SCOPE);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(telemetry_layer).with(log_layer).try_init()?;
        }
        (Some(tp), None) => {
            let tracer = tp.tracer(INSTRUMENTATION_SCOPE);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            registry.with(telemetry_layer).try_init()?;
        }
        (None, Some(lp)) => {
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(log_layer).try_init()?;
        }
        (None, None) => {
            registry.try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::trace::InMemorySpanExporter;

    fn in_memory_pipeline() -> (TelemetryPipeline, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (TelemetryPipeline::with_tracer_provider(provider), exporter)
    }

    #[test]
    fn close_is_idempotent() {
        let (pipeline, _exporter) = in_memory_pipeline();

        pipeline.close();
        pipeline.close();

        assert!(pipeline.tracer().is_none());
    }

    #[test]
    fn flush_after_close_is_a_noop() {
        let (pipeline, _exporter) = in_memory_pipeline();

        pipeline.close();

        assert!(pipeline.force_flush().is_ok());
    }

    #[test]
    fn disabled_pipeline_flushes_ok() {
        let pipeline = TelemetryPipeline {
            dsn: None,
            signals: Mutex::new(Signals::default()),
        };

        assert!(!pipeline.is_enabled());
        assert!(pipeline.force_flush().is_ok());
        assert!(pipeline.trace_url(&SpanContext::empty_context()).is_none());
    }

    #[test]
    fn trace_url_points_at_the_backend() {
        let pipeline = TelemetryPipeline {
            dsn: Some(Dsn::parse("https://token@otel.example.com/3").unwrap()),
            signals: Mutex::new(Signals::default()),
        };

        let url = pipeline.trace_url(&SpanContext::empty_context()).unwrap();
        assert!(url.starts_with("https://otel.example.com/traces/"));
        assert!(url.contains("span_id="));
    }
}
