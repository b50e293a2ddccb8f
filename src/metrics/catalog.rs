//! Built-in template catalogue
//!
//! The templates every service needs: generic execution/error/warning
//! counters and a processing-time summary, plus the request/response family
//! used by the lazy HTTP metric sets. The whole family is created and
//! registered in one batch; the first caller of any accessor triggers the
//! batch exactly once, no matter how many threads race on it.

use std::sync::{Arc, OnceLock};

use super::backend::Opts;
use super::registry::MetricRegistry;
use super::template::MetricTemplate;
use super::global_registry;
use crate::context::get_global_labels;
use crate::labels::LabelMap;

/// Declared labels of the generic templates.
const GENERIC_LABELS: &[&str] = &["of", "qualifier"];

/// Declared labels of the client request templates.
///
/// `of` names the endpoint being invoked, `protocol` the client protocol
/// (http, grpc, ...), `statusCode` the received status (or `-` where it makes
/// no sense), `qualifier` anything else the use case finds useful, and
/// `clientId` distinguishes multiple instances of the same client.
const CLIENT_LABELS: &[&str] = &["of", "protocol", "statusCode", "qualifier", "clientId"];

/// Declared labels of the server serve templates; `serverId` distinguishes
/// multiple instances of the same server.
const SERVER_LABELS: &[&str] = &["of", "protocol", "statusCode", "qualifier", "serverId"];

static CATALOG: OnceLock<Arc<TemplateCatalog>> = OnceLock::new();

/// The built-in metric template family.
///
/// Constructed in one batch so the templates share a single constant-label
/// snapshot, and registered immediately. The process-wide catalogue is
/// reached through the free accessor functions of this module; tests and
/// embedders can build private catalogues against their own registry.
pub struct TemplateCatalog {
    exec_count: MetricTemplate,
    error_count: MetricTemplate,
    warning_count: MetricTemplate,
    processing_time: MetricTemplate,

    client_req_sent_count: MetricTemplate,
    client_req_success_count: MetricTemplate,
    client_req_retried_warn_count: MetricTemplate,
    client_req_failed_count: MetricTemplate,
    client_req_processing_time: MetricTemplate,

    server_serve_started_count: MetricTemplate,
    server_serve_success_count: MetricTemplate,
    server_serve_failed_count: MetricTemplate,
    server_serve_processing_time: MetricTemplate,
}

impl TemplateCatalog {
    /// Create the whole template family and register it into `registry`.
    ///
    /// `const_labels` is the snapshot stamped on every template; pass
    /// [`get_global_labels`] for the conventional behavior. Registration
    /// failures are logged and non-fatal, template by template.
    pub fn new(registry: Option<&MetricRegistry>, const_labels: &LabelMap) -> Self {
        let counter = |name: &str, help: &str, labels: &[&str]| {
            let tpl = MetricTemplate::counter_with_const_labels(
                Opts::new(name, help),
                labels,
                const_labels,
            );
            tpl.register(registry);
            tpl
        };
        let summary = |name: &str, help: &str, labels: &[&str]| {
            let tpl = MetricTemplate::summary_with_const_labels(
                Opts::new(name, help),
                labels,
                const_labels,
            );
            tpl.register(registry);
            tpl
        };

        Self {
            exec_count: counter(
                "execCount",
                "Reports count of executions of something (check the 'of' label)",
                GENERIC_LABELS,
            ),
            error_count: counter(
                "errorCount",
                "Reports count of failures of something (check the 'of' label)",
                GENERIC_LABELS,
            ),
            warning_count: counter(
                "warningCount",
                "Reports count of warnings of something (check the 'of' label)",
                GENERIC_LABELS,
            ),
            processing_time: summary(
                "processingTime",
                "Reports processing time of something (check the 'of' label)",
                GENERIC_LABELS,
            ),

            client_req_sent_count: counter(
                "clientReqSentCount",
                "Reports count of sync client requests sent (check the 'of' label)",
                CLIENT_LABELS,
            ),
            client_req_success_count: counter(
                "clientReqSuccessCount",
                "Reports success count of sync client requests (check the 'of' label)",
                CLIENT_LABELS,
            ),
            client_req_retried_warn_count: counter(
                "clientReqRetriedWarnCount",
                "Reports count of times a sync client request had to be retried (check the 'of' label)",
                CLIENT_LABELS,
            ),
            client_req_failed_count: counter(
                "clientReqFailedCount",
                "Reports failure count of sync client requests (check the 'of' label)",
                CLIENT_LABELS,
            ),
            client_req_processing_time: summary(
                "clientReqProcessingTime",
                "Reports processing time of sync client requests (check the 'of' label)",
                CLIENT_LABELS,
            ),

            server_serve_started_count: counter(
                "serverServeStartedCount",
                "Reports count of requests a server started to process (check the 'of' label)",
                SERVER_LABELS,
            ),
            server_serve_success_count: counter(
                "serverServeSuccessCount",
                "Reports count of requests a server served successfully (check the 'of' label)",
                SERVER_LABELS,
            ),
            server_serve_failed_count: counter(
                "serverServeFailedCount",
                "Reports count of requests a server failed to serve (check the 'of' label)",
                SERVER_LABELS,
            ),
            server_serve_processing_time: summary(
                "serverServeProcessingTime",
                "Reports processing time of requests a server served (check the 'of' label)",
                SERVER_LABELS,
            ),
        }
    }

    /// Counter for executions of something.
    pub fn exec_count(&self) -> MetricTemplate {
        self.exec_count.clone()
    }

    /// Counter for failures of something.
    pub fn error_count(&self) -> MetricTemplate {
        self.error_count.clone()
    }

    /// Counter for warnings of something.
    pub fn warning_count(&self) -> MetricTemplate {
        self.warning_count.clone()
    }

    /// Summary for processing time of something.
    pub fn processing_time(&self) -> MetricTemplate {
        self.processing_time.clone()
    }

    /// Counter for requests sent by a sync client.
    pub fn client_req_sent_count(&self) -> MetricTemplate {
        self.client_req_sent_count.clone()
    }

    /// Counter for requests a sync client saw succeed.
    pub fn client_req_success_count(&self) -> MetricTemplate {
        self.client_req_success_count.clone()
    }

    /// Counter for requests a sync client had to retry.
    pub fn client_req_retried_warn_count(&self) -> MetricTemplate {
        self.client_req_retried_warn_count.clone()
    }

    /// Counter for requests a sync client saw fail.
    pub fn client_req_failed_count(&self) -> MetricTemplate {
        self.client_req_failed_count.clone()
    }

    /// Summary for request round-trip time of a sync client.
    pub fn client_req_processing_time(&self) -> MetricTemplate {
        self.client_req_processing_time.clone()
    }

    /// Counter for requests a server started to process.
    pub fn server_serve_started_count(&self) -> MetricTemplate {
        self.server_serve_started_count.clone()
    }

    /// Counter for requests a server served successfully.
    pub fn server_serve_success_count(&self) -> MetricTemplate {
        self.server_serve_success_count.clone()
    }

    /// Counter for requests a server failed to serve.
    pub fn server_serve_failed_count(&self) -> MetricTemplate {
        self.server_serve_failed_count.clone()
    }

    /// Summary for serve time of a server.
    pub fn server_serve_processing_time(&self) -> MetricTemplate {
        self.server_serve_processing_time.clone()
    }
}

/// The process-wide catalogue, created on first access.
///
/// Creation snapshots the global labels and registers into the global
/// registry, so call [`crate::metrics::init_metrics`] (or [`crate::init`])
/// first; otherwise the family is created unregistered and a warning is
/// logged per template.
pub fn global_catalog() -> Arc<TemplateCatalog> {
    CATALOG
        .get_or_init(|| {
            Arc::new(TemplateCatalog::new(
                global_registry().as_deref(),
                &get_global_labels(),
            ))
        })
        .clone()
}

/// Pre-defined counter template counting executions of something.
pub fn exec_count_template() -> MetricTemplate {
    global_catalog().exec_count()
}

/// Pre-defined counter template counting failures of something.
pub fn error_count_template() -> MetricTemplate {
    global_catalog().error_count()
}

/// Pre-defined counter template counting warnings of something.
pub fn warning_count_template() -> MetricTemplate {
    global_catalog().warning_count()
}

/// Pre-defined summary template reporting processing time of something.
pub fn processing_time_template() -> MetricTemplate {
    global_catalog().processing_time()
}

/// Pre-defined counter template for requests sent by any sync client.
pub fn client_req_sent_count_template() -> MetricTemplate {
    global_catalog().client_req_sent_count()
}

/// Pre-defined counter template for requests a sync client saw succeed.
pub fn client_req_success_count_template() -> MetricTemplate {
    global_catalog().client_req_success_count()
}

/// Pre-defined counter template for requests a sync client had to retry.
pub fn client_req_retried_warn_count_template() -> MetricTemplate {
    global_catalog().client_req_retried_warn_count()
}

/// Pre-defined counter template for requests a sync client saw fail.
pub fn client_req_failed_count_template() -> MetricTemplate {
    global_catalog().client_req_failed_count()
}

/// Pre-defined summary template for round-trip time of any sync client.
pub fn client_req_processing_time_template() -> MetricTemplate {
    global_catalog().client_req_processing_time()
}

/// Pre-defined counter template for requests a server started to process.
pub fn server_serve_started_count_template() -> MetricTemplate {
    global_catalog().server_serve_started_count()
}

/// Pre-defined counter template for requests a server served successfully.
pub fn server_serve_success_count_template() -> MetricTemplate {
    global_catalog().server_serve_success_count()
}

/// Pre-defined counter template for requests a server failed to serve.
pub fn server_serve_failed_count_template() -> MetricTemplate {
    global_catalog().server_serve_failed_count()
}

/// Pre-defined summary template for serve time of any server.
pub fn server_serve_processing_time_template() -> MetricTemplate {
    global_catalog().server_serve_processing_time()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels;
    use crate::metrics::template::MetricKind;

    #[test]
    fn test_family_is_created_and_registered_in_one_batch() {
        let registry = MetricRegistry::new();
        let catalog = TemplateCatalog::new(Some(&registry), &labels! { "serviceName" => "t" });

        for name in [
            "execCount",
            "errorCount",
            "warningCount",
            "processingTime",
            "clientReqSentCount",
            "clientReqSuccessCount",
            "clientReqRetriedWarnCount",
            "clientReqFailedCount",
            "clientReqProcessingTime",
            "serverServeStartedCount",
            "serverServeSuccessCount",
            "serverServeFailedCount",
            "serverServeProcessingTime",
        ] {
            assert!(registry.has_collector(name), "missing {name}");
        }
        assert_eq!(registry.len(), 13);

        assert_eq!(catalog.exec_count().kind(), MetricKind::Counter);
        assert_eq!(catalog.processing_time().kind(), MetricKind::Summary);
        assert!(catalog.client_req_sent_count().is_registered());
    }

    #[test]
    fn test_declared_label_schemas() {
        let catalog = TemplateCatalog::new(None, &LabelMap::new());

        assert_eq!(
            catalog.exec_count().label_names(),
            &["of", "qualifier", "metricType"]
        );
        assert_eq!(
            catalog.client_req_failed_count().label_names(),
            &["of", "protocol", "statusCode", "qualifier", "clientId", "metricType"]
        );
        assert_eq!(
            catalog.server_serve_success_count().label_names(),
            &["of", "protocol", "statusCode", "qualifier", "serverId", "metricType"]
        );
    }

    #[test]
    fn test_global_accessors_are_idempotent_under_concurrency() {
        use std::sync::Barrier;

        let barrier = Arc::new(Barrier::new(8));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    let tpl = exec_count_template();
                    tpl.counter_instance(
                        &labels! { "of" => "catalogTest", "qualifier" => "-" },
                    )
                    .inc();
                    tpl.fq_name().to_string()
                })
            })
            .collect();

        for thread in threads {
            assert_eq!(thread.join().unwrap(), "execCount");
        }

        // One underlying series despite eight racing first-callers.
        let value = exec_count_template()
            .counter_instance(&labels! { "of" => "catalogTest", "qualifier" => "-" })
            .value();
        assert_eq!(value, 8);
    }
}
