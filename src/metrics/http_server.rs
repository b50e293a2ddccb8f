//! Lazy metrics for HTTP servers
//!
//! The server-side twin of [`super::http_client`]: a per-handler bundle of
//! serve metrics, created lazily per HTTP method and status code. The
//! composite cache key is method plus status code, so `GET`/`200` and
//! `POST`/`200` are independent series.
//!
//! Status codes are strings for the same cardinality reason as on the client
//! side: report `"2xx"` instead of exact codes when coarse buckets are
//! enough.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use parking_lot::Mutex;

use super::backend::{CounterHandle, SummaryHandle};
use super::catalog::{global_catalog, TemplateCatalog};
use crate::labels::LabelMap;

/// Placeholder for optional label dimensions that were not set.
const NONE_VALUE: &str = "-";

/// Lazily-populated metrics set for one logical HTTP server or handler.
///
/// Create one per handler role at startup; the observation methods cover the
/// serve lifecycle. Caches grow by one entry per distinct method / status
/// combination ever seen and are never evicted.
///
/// # Example
///
/// ```
/// use beacon::metrics::HttpServerMetrics;
/// use http::Method;
///
/// let metrics = HttpServerMetrics::new("ping");
///
/// metrics.serve_started(&Method::GET);
/// metrics.serve_took_millis(&Method::GET, "200", 42.0);
/// metrics.serve_succeeded(&Method::GET, "200");
/// ```
pub struct HttpServerMetrics {
    of: String,
    server_id: String,
    catalog: Arc<TemplateCatalog>,

    serve_started_by_method: Mutex<HashMap<String, CounterHandle>>,
    serve_success_by_key: Mutex<HashMap<String, CounterHandle>>,
    serve_failed_by_key: Mutex<HashMap<String, CounterHandle>>,
    serve_time_by_key: Mutex<HashMap<String, SummaryHandle>>,
}

impl HttpServerMetrics {
    /// Create a metrics set for the handler named `of`.
    ///
    /// # Panics
    ///
    /// Panics when `of` is empty; a metric without an `of` value gives no
    /// operational signal, so this is a fatal configuration error.
    pub fn new(of: impl Into<String>) -> Self {
        let of = of.into();
        if of.is_empty() {
            panic!("cannot create HttpServerMetrics with an empty `of` parameter");
        }

        Self {
            of,
            server_id: NONE_VALUE.to_string(),
            catalog: global_catalog(),
            serve_started_by_method: Mutex::new(HashMap::new()),
            serve_success_by_key: Mutex::new(HashMap::new()),
            serve_failed_by_key: Mutex::new(HashMap::new()),
            serve_time_by_key: Mutex::new(HashMap::new()),
        }
    }

    /// Assign a server id to every series in the set. Useful when one
    /// logical server runs as several instances.
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        let server_id = server_id.into();
        if !server_id.is_empty() {
            self.server_id = server_id;
        }
        self
    }

    /// Take templates from a private catalogue instead of the process-wide
    /// one. Mainly for tests and embedders running their own registry.
    pub fn with_catalog(mut self, catalog: Arc<TemplateCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Record that the server started processing a request.
    pub fn serve_started(&self, method: &Method) {
        let mut cache = self.serve_started_by_method.lock();
        let counter = cache.entry(method.as_str().to_string()).or_insert_with(|| {
            self.catalog
                .server_serve_started_count()
                .counter_instance(&self.instance_labels(method, NONE_VALUE))
        });
        counter.inc();
    }

    /// Record a request served successfully, with the status code returned
    /// to the client (`"200"`, `"2xx"`, ...).
    pub fn serve_succeeded(&self, method: &Method, status_code: &str) {
        let mut cache = self.serve_success_by_key.lock();
        let counter = cache
            .entry(composite_key(method, status_code))
            .or_insert_with(|| {
                self.catalog
                    .server_serve_success_count()
                    .counter_instance(&self.instance_labels(method, status_code))
            });
        counter.inc();
    }

    /// Record a request the server failed to serve, with the status code
    /// returned to the client (`"500"`, `"5xx"`, ...).
    pub fn serve_failed(&self, method: &Method, status_code: &str) {
        let mut cache = self.serve_failed_by_key.lock();
        let counter = cache
            .entry(composite_key(method, status_code))
            .or_insert_with(|| {
                self.catalog
                    .server_serve_failed_count()
                    .counter_instance(&self.instance_labels(method, status_code))
            });
        counter.inc();
    }

    /// Record how long serving the request took, segregated by method and
    /// status code.
    pub fn serve_took_millis(&self, method: &Method, status_code: &str, millis: f64) {
        let summary = {
            let mut cache = self.serve_time_by_key.lock();
            cache
                .entry(composite_key(method, status_code))
                .or_insert_with(|| {
                    self.catalog
                        .server_serve_processing_time()
                        .summary_instance(&self.instance_labels(method, status_code))
                })
                .clone()
        };
        summary.observe(millis);
    }

    fn instance_labels(&self, method: &Method, status_code: &str) -> LabelMap {
        crate::labels! {
            "of" => self.of.as_str(),
            "protocol" => "http",
            "statusCode" => status_code,
            "qualifier" => method.as_str(),
            "serverId" => self.server_id.as_str(),
        }
    }
}

fn composite_key(method: &Method, status_code: &str) -> String {
    format!("{}{}", method.as_str(), status_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels;
    use crate::metrics::registry::MetricRegistry;

    fn test_set(registry: &MetricRegistry, of: &str) -> HttpServerMetrics {
        let catalog = Arc::new(TemplateCatalog::new(
            Some(registry),
            &labels! { "serviceName" => "payments", "serviceVer" => "1.2" },
        ));
        HttpServerMetrics::new(of).with_catalog(catalog)
    }

    #[test]
    #[should_panic(expected = "empty `of` parameter")]
    fn test_empty_of_is_fatal() {
        HttpServerMetrics::new("");
    }

    #[test]
    fn test_started_counter_is_keyed_by_method() {
        let registry = MetricRegistry::new();
        let metrics = test_set(&registry, "ping");

        metrics.serve_started(&Method::GET);
        metrics.serve_started(&Method::GET);
        metrics.serve_started(&Method::POST);

        let output = registry.gather();
        assert!(
            output.contains("serverServeStartedCount{metricType=\"counter\",of=\"ping\",protocol=\"http\",qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"-\"} 2"),
            "{output}"
        );
        assert!(output.contains("qualifier=\"POST\""), "{output}");
    }

    #[test]
    fn test_distinct_methods_with_same_status_are_independent() {
        let registry = MetricRegistry::new();
        let metrics = test_set(&registry, "ping");

        metrics.serve_succeeded(&Method::GET, "200");
        metrics.serve_succeeded(&Method::GET, "200");
        metrics.serve_succeeded(&Method::POST, "200");

        let output = registry.gather();
        assert!(
            output.contains("qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"200\"} 2"),
            "{output}"
        );
        assert!(
            output.contains("qualifier=\"POST\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"200\"} 1"),
            "{output}"
        );
    }

    #[test]
    fn test_failed_counter_uses_its_own_template() {
        let registry = MetricRegistry::new();
        let metrics = test_set(&registry, "ping");

        metrics.serve_failed(&Method::DELETE, "5xx");

        let output = registry.gather();
        assert!(output.contains("serverServeFailedCount{"), "{output}");
        assert!(output.contains("qualifier=\"DELETE\""), "{output}");
        assert!(output.contains("statusCode=\"5xx\"} 1"), "{output}");
    }

    #[test]
    fn test_server_id_reaches_labels() {
        let registry = MetricRegistry::new();
        let catalog = Arc::new(TemplateCatalog::new(Some(&registry), &LabelMap::new()));
        let metrics = HttpServerMetrics::new("ping")
            .with_server_id("replica-2")
            .with_catalog(catalog);

        metrics.serve_succeeded(&Method::GET, "200");

        assert!(registry.gather().contains("serverId=\"replica-2\""));
    }

    // The full serve lifecycle: started, timed, succeeded, with the
    // instance-identifying constant labels on every series.
    #[test]
    fn test_serve_lifecycle_end_to_end() {
        let registry = MetricRegistry::new();
        let metrics = test_set(&registry, "ping");

        metrics.serve_started(&Method::GET);
        metrics.serve_took_millis(&Method::GET, "200", 42.0);
        metrics.serve_succeeded(&Method::GET, "200");

        let output = registry.gather();

        // One started counter at 1, keyed by GET.
        assert!(
            output.contains("serverServeStartedCount{")
                && output.contains("qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"-\"} 1"),
            "{output}"
        );
        // One observation of 42 in the GET/200 summary.
        assert!(
            output.contains("serverServeProcessingTime_count{metricType=\"summary\",of=\"ping\",protocol=\"http\",qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"200\"} 1"),
            "{output}"
        );
        assert!(
            output.contains("serverServeProcessingTime_sum{metricType=\"summary\",of=\"ping\",protocol=\"http\",qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"200\"} 42"),
            "{output}"
        );
        // One succeeded counter at 1, keyed by GET/200.
        assert!(
            output.contains("serverServeSuccessCount{metricType=\"counter\",of=\"ping\",protocol=\"http\",qualifier=\"GET\",serverId=\"-\",serviceName=\"payments\",serviceVer=\"1.2\",statusCode=\"200\"} 1"),
            "{output}"
        );
        // Every series carries the constant labels.
        for line in output.lines().filter(|l| !l.starts_with('#') && !l.is_empty()) {
            assert!(
                line.contains("serviceName=\"payments\"") && line.contains("serviceVer=\"1.2\""),
                "series without constant labels: {line}"
            );
        }
    }

    #[test]
    fn test_repeated_observations_reuse_the_cached_handle() {
        let registry = MetricRegistry::new();
        let metrics = test_set(&registry, "ping");

        for _ in 0..5 {
            metrics.serve_succeeded(&Method::GET, "200");
        }

        // Five observations land on one series, never on a duplicate handle.
        let output = registry.gather();
        let occurrences = output
            .lines()
            .filter(|l| l.starts_with("serverServeSuccessCount{"))
            .count();
        assert_eq!(occurrences, 1, "{output}");
        assert!(output.contains("statusCode=\"200\"} 5"), "{output}");
    }
}
