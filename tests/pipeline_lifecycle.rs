//! End-to-end pipeline lifecycle checks.
//!
//! These exercise the public surface the way a host application would:
//! build, install, flush, close. Installation against a live collector is
//! out of scope here; the endpoint below is a local address nothing
//! listens on, which is fine because exporters only touch the network
//! when spans are actually batched out.

use otlp_bootstrap::{PipelineBuilder, PipelineError, active, force_flush};

// The installed pipeline is process-global state, so the scenarios that
// publish one run as a single sequential test.
#[test]
fn lifecycle_end_to_end() {
    // No DSN: telemetry disabled, every operation a safe no-op.
    let pipeline = PipelineBuilder::new()
        .service_name("lifecycle-test")
        .install()
        .unwrap();

    assert!(!pipeline.is_enabled());
    assert!(pipeline.dsn().is_none());
    assert!(pipeline.force_flush().is_ok());
    pipeline.close();
    pipeline.close();

    // Helper functions resolve the published instance.
    assert!(active().is_some());
    assert!(force_flush().is_ok());

    // Real DSN against a dead local port: installation still succeeds,
    // because exporter construction does not dial the endpoint.
    let pipeline = PipelineBuilder::new()
        .dsn("http://test-token@127.0.0.1:14318")
        .service_name("lifecycle-test")
        .metrics(false)
        .logs(false)
        .install()
        .unwrap();

    assert!(pipeline.is_enabled());
    let dsn = pipeline.dsn().unwrap();
    assert_eq!(dsn.otlp_http_endpoint(), "http://127.0.0.1:14318");

    assert!(pipeline.force_flush().is_ok());
    pipeline.close();
    assert!(pipeline.force_flush().is_ok());
    pipeline.close();
}

#[test]
fn invalid_dsn_fails_installation() {
    let error = PipelineBuilder::new()
        .dsn("not a connection string")
        .install()
        .unwrap_err();

    assert!(matches!(error, PipelineError::InvalidDsn { .. }));
}

#[test]
fn empty_dsn_disables_telemetry() {
    let pipeline = PipelineBuilder::new().dsn("").install().unwrap();

    assert!(!pipeline.is_enabled());
}
