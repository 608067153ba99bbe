//! OTLP telemetry bootstrap for services shipping traces, metrics, and
//! logs to an OpenTelemetry backend over OTLP/HTTP.
//!
//! One connection descriptor (a DSN) drives the whole pipeline: parse it
//! once, derive per-signal endpoints and auth headers from it, and stand
//! up batch-exporting providers for each enabled signal. The pipeline is
//! fail-soft: a signal whose exporter cannot be built is logged and
//! skipped rather than failing installation, and an absent DSN disables
//! telemetry entirely while keeping every call a safe no-op.
//!
//! ```no_run
//! use otlp_bootstrap::PipelineBuilder;
//!
//! # fn main() -> otlp_bootstrap::Result<()> {
//! let pipeline = PipelineBuilder::new()
//!     .dsn("https://token@otel.example.com")
//!     .service_name("checkout")
//!     .install()?;
//!
//! // ... run the application ...
//!
//! pipeline.force_flush()?;
//! pipeline.close();
//! # Ok(())
//! # }
//! ```

mod config;
mod dsn;
mod error;
mod id_generator;
mod pipeline;
mod report;
mod resource;
mod signal;

pub use config::{PipelineBuilder, TlsConfig};
pub use dsn::Dsn;
pub use error::{PipelineError, Result};
pub use id_generator::TimeBiasedIdGenerator;
pub use pipeline::{TelemetryPipeline, active, force_flush};
pub use report::{report_error, report_panic};
pub use resource::HostResourceDetector;
pub use signal::metrics::preferred_temporality;
