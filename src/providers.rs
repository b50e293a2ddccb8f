//! Subscriber assembly
//!
//! Installs the tracing subscriber the facade logs through. Only a stdout
//! provider ships here; remote log shippers are the host application's
//! concern and compose onto the same subscriber on their side.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::TelemetryError;

/// Install the global tracing subscriber.
///
/// The environment (`RUST_LOG`) wins over the configured filter when both
/// are present. Fails if the filter cannot be parsed or a subscriber is
/// already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.effective_filter()))
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))?;

    let fmt_layer: Box<dyn Layer<_> + Send + Sync> = match config.log_format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::Provider(format!("failed to install subscriber: {e}")))
}
