//! Lazy metrics for HTTP clients
//!
//! A per-client bundle of request/response metrics. The set starts empty and
//! creates each concrete time series the first time it is observed, keyed by
//! status code, so a client gets per-status counters and round-trip summaries
//! without declaring anything up front.
//!
//! Status codes are strings on purpose: a caller who does not want full
//! per-code granularity can report range buckets like `"2xx"` or `"5xx"`,
//! trading precision for lower label cardinality.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{CounterHandle, SummaryHandle};
use super::catalog::{global_catalog, TemplateCatalog};
use crate::labels::{LabelMap, LabelValue};

/// Placeholder for optional label dimensions that were not set.
const NONE_VALUE: &str = "-";

/// Lazily-populated metrics set for one logical HTTP client.
///
/// Create one per client role at startup and call the observation methods
/// from the request/response lifecycle. Each cache grows by one entry per
/// distinct status code ever seen and is never evicted; cardinality is
/// bounded by the number of status codes, not by request volume.
///
/// # Example
///
/// ```
/// use beacon::metrics::HttpClientMetrics;
///
/// let metrics = HttpClientMetrics::new("tile-api")
///     .with_qualifier("GET")
///     .with_client_id("pool-1");
///
/// metrics.request_sent();
/// metrics.request_took_millis("200", 12.7);
/// metrics.request_succeeded("200");
/// ```
pub struct HttpClientMetrics {
    of: String,
    qualifier: LabelValue,
    client_id: String,
    catalog: Arc<TemplateCatalog>,

    req_sent: Mutex<Option<CounterHandle>>,
    req_success_by_status: Mutex<HashMap<String, CounterHandle>>,
    req_retried_by_status: Mutex<HashMap<String, CounterHandle>>,
    req_failed_by_status: Mutex<HashMap<String, CounterHandle>>,
    req_time_by_status: Mutex<HashMap<String, SummaryHandle>>,
}

impl HttpClientMetrics {
    /// Create a metrics set for the endpoint named `of`.
    ///
    /// Pick the most meaningful name of the endpoint this client invokes;
    /// it becomes the `of` label on every series the set creates.
    ///
    /// # Panics
    ///
    /// Panics when `of` is empty: a metric without an `of` value gives no
    /// operational signal, so this is a fatal configuration error.
    pub fn new(of: impl Into<String>) -> Self {
        let of = of.into();
        if of.is_empty() {
            panic!("cannot create HttpClientMetrics with an empty `of` parameter");
        }

        Self {
            of,
            qualifier: LabelValue::Text(NONE_VALUE.to_string()),
            client_id: NONE_VALUE.to_string(),
            catalog: global_catalog(),
            req_sent: Mutex::new(None),
            req_success_by_status: Mutex::new(HashMap::new()),
            req_retried_by_status: Mutex::new(HashMap::new()),
            req_failed_by_status: Mutex::new(HashMap::new()),
            req_time_by_status: Mutex::new(HashMap::new()),
        }
    }

    /// Assign a qualifier to every series in the set. The HTTP method (GET,
    /// POST, ...) makes a good qualifier, but any value works.
    pub fn with_qualifier(mut self, qualifier: impl Into<LabelValue>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Assign a client id to every series in the set. Useful when one
    /// logical client runs as several instances.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        let client_id = client_id.into();
        if !client_id.is_empty() {
            self.client_id = client_id;
        }
        self
    }

    /// Take templates from a private catalogue instead of the process-wide
    /// one. Mainly for tests and embedders running their own registry.
    pub fn with_catalog(mut self, catalog: Arc<TemplateCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Record that the client sent a request.
    pub fn request_sent(&self) {
        let mut cached = self.req_sent.lock();
        let counter = cached.get_or_insert_with(|| {
            self.catalog
                .client_req_sent_count()
                .counter_instance(&self.instance_labels(NONE_VALUE))
        });
        counter.inc();
    }

    /// Record a success observed with the given status code (`"200"`,
    /// `"2xx"`, ...).
    pub fn request_succeeded(&self, status_code: &str) {
        let mut cache = self.req_success_by_status.lock();
        let counter = cache.entry(status_code.to_string()).or_insert_with(|| {
            self.catalog
                .client_req_success_count()
                .counter_instance(&self.instance_labels(status_code))
        });
        counter.inc();
    }

    /// Record that a request had to be retried, with the status code that
    /// caused the retry.
    pub fn request_retried(&self, status_code: &str) {
        let mut cache = self.req_retried_by_status.lock();
        let counter = cache.entry(status_code.to_string()).or_insert_with(|| {
            self.catalog
                .client_req_retried_warn_count()
                .counter_instance(&self.instance_labels(status_code))
        });
        counter.inc();
    }

    /// Record a failure observed with the given status code (`"500"`,
    /// `"5xx"`, ...).
    pub fn request_failed(&self, status_code: &str) {
        let mut cache = self.req_failed_by_status.lock();
        let counter = cache.entry(status_code.to_string()).or_insert_with(|| {
            self.catalog
                .client_req_failed_count()
                .counter_instance(&self.instance_labels(status_code))
        });
        counter.inc();
    }

    /// Record the request/response round-trip time, segregated by status
    /// code.
    pub fn request_took_millis(&self, status_code: &str, millis: f64) {
        let summary = {
            let mut cache = self.req_time_by_status.lock();
            cache
                .entry(status_code.to_string())
                .or_insert_with(|| {
                    self.catalog
                        .client_req_processing_time()
                        .summary_instance(&self.instance_labels(status_code))
                })
                .clone()
        };
        summary.observe(millis);
    }

    fn instance_labels(&self, status_code: &str) -> LabelMap {
        crate::labels! {
            "of" => self.of.as_str(),
            "protocol" => "http",
            "statusCode" => status_code,
            "qualifier" => self.qualifier.clone(),
            "clientId" => self.client_id.as_str(),
        }
    }
}
