//! Per-signal pipeline configuration.
//!
//! The three signals (trace, metric, log) share the same transport shape:
//! an OTLP/HTTP binary exporter bound to the DSN endpoint with gzip
//! compression and the DSN auth headers, wrapped in a batching component
//! sized from host parallelism. Each signal is configured independently;
//! a failure in one leaves the others untouched.

pub(crate) mod logs;
pub(crate) mod metrics;
pub(crate) mod trace;

use crate::config::TlsConfig;
use crate::dsn::Dsn;
use crate::error::Result;
use opentelemetry_otlp::{Compression, Protocol, WithExportConfig, WithHttpConfig};
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

/// Scheduled delay and export timeout for trace and log batching.
pub(crate) const BATCH_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval of the periodic metric reader. Metrics are aggregated rather
/// than queued as discrete events, so there is no batch dimension.
pub(crate) const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(15);

const MIN_QUEUE_SIZE: usize = 1_000;
const MAX_QUEUE_SIZE: usize = 16_000;

/// Queue size for the batching processors, derived from host parallelism.
///
/// `clamp((parallelism / 2) * 1000, 1000, 16000)`, applied identically to
/// the maximum queue size and the maximum export batch size of every
/// batching processor.
pub(crate) fn batch_queue_size() -> usize {
    let parallelism = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    queue_size_for(parallelism)
}

fn queue_size_for(parallelism: usize) -> usize {
    ((parallelism / 2) * 1_000).clamp(MIN_QUEUE_SIZE, MAX_QUEUE_SIZE)
}

/// Applies the shared transport settings to one signal's exporter builder.
pub(crate) fn apply_transport<B>(
    builder: B,
    dsn: &Dsn,
    signal_path: &str,
    tls: Option<&TlsConfig>,
) -> Result<B>
where
    B: WithExportConfig + WithHttpConfig,
{
    let mut builder = builder
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(dsn.signal_endpoint(signal_path))
        .with_timeout(BATCH_EXPORT_TIMEOUT)
        .with_compression(Compression::Gzip);

    let headers = dsn.headers();
    if !headers.is_empty() {
        builder = builder.with_headers(headers);
    }

    // A plain http scheme carries its own insecurity in the endpoint URL;
    // TLS settings only matter for https backends.
    if let Some(tls) = tls {
        builder = builder.with_http_client(http_client(tls)?);
    }

    Ok(builder)
}

fn http_client(tls: &TlsConfig) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder().timeout(BATCH_EXPORT_TIMEOUT);

    if let Some(pem) = &tls.ca_certificate_pem {
        builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
    }
    if tls.accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_size_scales_with_parallelism_and_clamps() {
        let cases = [(1, 1_000), (2, 1_000), (8, 4_000), (40, 16_000), (64, 16_000)];

        for (parallelism, expected) in cases {
            assert_eq!(queue_size_for(parallelism), expected, "parallelism {parallelism}");
        }
    }

    #[test]
    fn queue_size_stays_within_bounds() {
        for parallelism in 1..=512 {
            let size = queue_size_for(parallelism);
            assert!((MIN_QUEUE_SIZE..=MAX_QUEUE_SIZE).contains(&size));
        }
    }
}
