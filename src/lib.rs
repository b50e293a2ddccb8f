//! # Beacon
//!
//! Instrumentation facade for services: structured log labels and
//! lazily-cached, template-driven metrics, without tying application code to
//! a metrics backend's API shape.
//!
//! ## Features
//!
//! - **Global label context**: service name/version, host and instance id,
//!   derived from the environment once and stamped on every metric as
//!   constant labels
//! - **Metric templates**: named counter/gauge/summary definitions with a
//!   fixed label schema, created once and registered into a shared registry
//! - **Lazy instances**: each concrete time series is created the first time
//!   its label-value combination is observed, then cached forever
//! - **Lazy HTTP metric sets**: ready-made request/response metrics for HTTP
//!   clients and servers, keyed by method and status code
//! - **Label coercion**: arbitrary scalar values become typed log labels or
//!   string metric labels, degrading gracefully instead of failing
//!
//! ## Quick Start
//!
//! ```no_run
//! use beacon::{init, TelemetryConfig};
//! use beacon::metrics::HttpServerMetrics;
//! use http::Method;
//!
//! fn main() -> Result<(), beacon::TelemetryError> {
//!     // Initialize logging, global labels and the metric registry.
//!     init(TelemetryConfig::from_env())?;
//!
//!     // Create one metrics set per handler role.
//!     let ping = HttpServerMetrics::new("ping");
//!
//!     // Observe the serve lifecycle; series are created on first use.
//!     ping.serve_started(&Method::GET);
//!     ping.serve_took_millis(&Method::GET, "200", 42.0);
//!     ping.serve_succeeded(&Method::GET, "200");
//!     Ok(())
//! }
//! ```

mod config;
pub mod context;
mod error;
pub mod labels;
pub mod logging;
pub mod metrics;
mod providers;

// Re-exports
pub use config::{LogFormat, TelemetryConfig, TelemetryConfigBuilder};
pub use context::{build_global_labels, get_global_labels, set_global_labels};
pub use error::{RegistryError, TelemetryError};
pub use labels::{
    to_loggable_labels, to_metric_label_values, Label, LabelMap, LabelValue, LogValue,
};
pub use logging::{build_default_global_log_labels, global_log_labels, set_global_log_labels};

use tracing::info;

/// Initialize the whole telemetry stack.
///
/// Call once at application startup, before any logging occurs. In order:
/// installs the tracing subscriber, bootstraps the metric registry with the
/// environment-derived global labels (or the override carried by `config`),
/// and installs the same labels for the logging side.
///
/// # Errors
///
/// Returns an error when the log filter cannot be parsed or a tracing
/// subscriber is already installed.
pub fn init(config: TelemetryConfig) -> Result<(), TelemetryError> {
    providers::init_tracing(&config)?;

    metrics::init_metrics();
    if let Some(labels) = &config.global_labels {
        set_global_labels(labels.clone());
    }
    set_global_log_labels(to_loggable_labels(&get_global_labels()));

    info!(
        log_format = ?config.log_format,
        log_filter = %config.log_filter,
        "Telemetry initialized"
    );

    Ok(())
}
