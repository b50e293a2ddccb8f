//! Telemetry Configuration
//!
//! Startup configuration for the facade: how log output is rendered and
//! filtered, and optionally which global labels to install instead of the
//! environment-derived ones. Metrics need no configuration of their own;
//! the registry is bootstrapped by [`crate::metrics::init_metrics`].

use std::env;

use crate::labels::LabelMap;

/// Log output format
#[derive(Debug, Clone, Default)]
pub enum LogFormat {
    /// Multi-line, human-oriented output for local development
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation pipelines
    Json,
    /// Terse single-line output
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Complete telemetry configuration, consumed by [`crate::init`].
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Log level filter (e.g., "info", "debug", "myapp=debug,hyper=info");
    /// empty means "info"
    pub log_filter: String,
    /// Global labels to install instead of the environment-derived ones.
    /// `None` keeps the [`crate::build_global_labels`] defaults.
    pub global_labels: Option<LabelMap>,
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOG_FORMAT`: "pretty", "json", or "compact" (default: "pretty")
    /// - `RUST_LOG`: log filter directive (default: "info")
    ///
    /// The identity fields feeding the global labels (`SERVICE_NAME` and
    /// friends) are read separately, by [`crate::build_global_labels`].
    pub fn from_env() -> Self {
        Self {
            log_format: env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            log_filter: env::var("RUST_LOG").unwrap_or_default(),
            global_labels: None,
        }
    }

    /// The configured filter, with the default applied.
    pub(crate) fn effective_filter(&self) -> &str {
        if self.log_filter.is_empty() {
            "info"
        } else {
            &self.log_filter
        }
    }

    /// Start building a configuration programmatically
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }
}

/// Builder for [`TelemetryConfig`]
#[derive(Default)]
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Choose how log events are rendered
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Choose which log events pass the filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    /// Install these global labels at init instead of the
    /// environment-derived ones
    pub fn global_labels(mut self, labels: LabelMap) -> Self {
        self.config.global_labels = Some(labels);
        self
    }

    /// Finish and return the configuration
    pub fn build(self) -> TelemetryConfig {
        self.config
    }
}
