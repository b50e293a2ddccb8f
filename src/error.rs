//! Error types
//!
//! Only two conditions in this crate are worth an error value: a telemetry
//! bootstrap that cannot proceed, and a registry collision at registration
//! time. Programmer errors (kind mismatch, empty `of`, missing declared
//! label) are panics by design; they signal incorrect wiring, not runtime
//! data issues.

use thiserror::Error;

/// Telemetry bootstrap errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Invalid configuration (e.g. an unparsable log filter)
    #[error("telemetry config error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed
    #[error("telemetry provider error: {0}")]
    Provider(String),
}

/// Errors surfaced by the metric registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A collector with this fully-qualified name already exists
    #[error("a collector named `{0}` is already registered")]
    AlreadyRegistered(String),
}
