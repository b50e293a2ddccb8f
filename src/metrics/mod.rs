//! Metrics facade
//!
//! The template/instance abstraction with lazy per-label-combination
//! caching. What a metric *means* (name, kind, fixed label schema) lives in
//! a [`MetricTemplate`], created once and registered into a
//! [`MetricRegistry`]; which concrete time series *exists* is decided lazily,
//! the first time a label-value combination is observed.
//!
//! # Quick Start
//!
//! ```no_run
//! use beacon::metrics::{self, HttpServerMetrics};
//! use http::Method;
//!
//! // Once, at startup: create the registry and snapshot the global labels.
//! metrics::init_metrics();
//!
//! // Once per handler role.
//! let ping = HttpServerMetrics::new("ping");
//!
//! // In the serve lifecycle.
//! ping.serve_started(&Method::GET);
//! ping.serve_took_millis(&Method::GET, "200", 42.0);
//! ping.serve_succeeded(&Method::GET, "200");
//!
//! // Wherever the scrape surface lives.
//! let exposition = metrics::global_registry().unwrap().gather();
//! ```
//!
//! # Layers
//!
//! - [`backend`]: vector-shaped counter/gauge/summary primitives and the
//!   per-combination handles they hand out
//! - [`registry`]: the named-collector table templates register into
//! - [`exposition`]: Prometheus text rendering of a registry
//! - [`template`]: the template layer proper
//! - [`catalog`]: the built-in template family, created in one batch
//! - [`http_client`] / [`http_server`]: lazy per-role metric sets

pub mod backend;
pub mod catalog;
pub mod exposition;
pub mod http_client;
pub mod http_server;
pub mod registry;
pub mod template;

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::context::{build_global_labels, set_global_labels};

// Core types
pub use backend::{
    CounterHandle, CounterVec, GaugeHandle, GaugeVec, MetricDesc, Opts, SummaryHandle,
    SummarySnapshot, SummaryVec, DEFAULT_QUANTILES,
};
pub use registry::{Collector, MetricRegistry};
pub use template::{MetricKind, MetricTemplate, METRIC_TYPE_LABEL};

// Built-in catalogue
pub use catalog::{
    client_req_failed_count_template, client_req_processing_time_template,
    client_req_retried_warn_count_template, client_req_sent_count_template,
    client_req_success_count_template, error_count_template, exec_count_template, global_catalog,
    processing_time_template, server_serve_failed_count_template,
    server_serve_processing_time_template, server_serve_started_count_template,
    server_serve_success_count_template, warning_count_template, TemplateCatalog,
};

// Lazy metric sets
pub use http_client::HttpClientMetrics;
pub use http_server::HttpServerMetrics;

static REGISTRY: OnceLock<Arc<MetricRegistry>> = OnceLock::new();

/// Bootstrap the process-wide metric registry.
///
/// Creates the global registry (the first caller wins; later calls are
/// no-ops returning the existing one), then derives the global labels from
/// the environment and installs them so templates created from here on carry
/// them as constant labels. Feel free to replace the labels afterwards via
/// [`crate::context::set_global_labels`] before the first template is
/// created.
pub fn init_metrics() -> Arc<MetricRegistry> {
    REGISTRY
        .get_or_init(|| {
            set_global_labels(build_global_labels());
            info!("metric registry initialized");
            Arc::new(MetricRegistry::new())
        })
        .clone()
}

/// The process-wide metric registry, `None` until [`init_metrics`] ran.
pub fn global_registry() -> Option<Arc<MetricRegistry>> {
    REGISTRY.get().cloned()
}
