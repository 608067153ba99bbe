//! Metric signal configuration.

use crate::config::TlsConfig;
use crate::dsn::Dsn;
use crate::error::{PipelineError, Result};
use crate::signal::{self, METRIC_EXPORT_INTERVAL};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{InstrumentKind, PeriodicReader, SdkMeterProvider, Temporality};

/// Builds a meter provider exporting to the DSN endpoint.
pub(crate) fn configure(
    dsn: &Dsn,
    resource: Resource,
    tls: Option<&TlsConfig>,
) -> Result<SdkMeterProvider> {
    let builder = opentelemetry_otlp::MetricExporter::builder()
        // A delta preference makes the SDK resolve each instrument kind the
        // way `preferred_temporality` does; gauges carry no aggregation
        // temporality on the OTLP wire.
        .with_temporality(Temporality::Delta)
        .with_http();
    let exporter = signal::apply_transport(builder, dsn, "/v1/metrics", tls)?
        .build()
        .map_err(PipelineError::MetricExporter)?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRIC_EXPORT_INTERVAL)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

/// Export temporality per instrument kind.
///
/// Rate-style instruments (counters, observable counters, histograms)
/// export deltas so the backend can compute rates without diffing running
/// totals; level-style instruments (gauges, up-down counters) export
/// cumulative values because their current level is the meaningful reading.
pub fn preferred_temporality(kind: InstrumentKind) -> Temporality {
    match kind {
        InstrumentKind::Counter
        | InstrumentKind::ObservableCounter
        | InstrumentKind::Histogram => Temporality::Delta,
        _ => Temporality::Cumulative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_instruments_use_delta() {
        for kind in [
            InstrumentKind::Counter,
            InstrumentKind::ObservableCounter,
            InstrumentKind::Histogram,
        ] {
            assert_eq!(preferred_temporality(kind), Temporality::Delta, "{kind:?}");
        }
    }

    #[test]
    fn level_instruments_use_cumulative() {
        for kind in [
            InstrumentKind::UpDownCounter,
            InstrumentKind::ObservableUpDownCounter,
            InstrumentKind::Gauge,
            InstrumentKind::ObservableGauge,
        ] {
            assert_eq!(
                preferred_temporality(kind),
                Temporality::Cumulative,
                "{kind:?}"
            );
        }
    }
}
