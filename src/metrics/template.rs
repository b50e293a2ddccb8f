//! Metric templates
//!
//! A template is what a metric *means*: a fully-qualified name, a kind
//! (counter, gauge or summary), and a fixed set of declared label names. A
//! concrete time series only comes into existence when someone binds values
//! to those names and asks the template for an instance.
//!
//! Templates snapshot the global labels (see [`crate::context`]) as constant
//! labels at the moment they are created, register themselves into a
//! [`MetricRegistry`] at most once, and are cheap to clone and share across
//! call sites. Registration failure is recoverable (logged, template stays
//! usable); asking a template for an instance of the wrong kind is not.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use super::backend::{
    CounterHandle, CounterVec, GaugeHandle, GaugeVec, Opts, SummaryHandle, SummaryVec,
};
use super::registry::{Collector, MetricRegistry};
use crate::context::get_global_labels;
use crate::labels::{to_metric_label_values, LabelMap};

/// The implicit label appended to every template's declared label names and
/// filled in automatically on every instance request.
pub const METRIC_TYPE_LABEL: &str = "metricType";

/// The kind of time series a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
}

impl MetricKind {
    /// The kind's label value (`counter` | `gauge` | `summary`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum VecHandle {
    Counter(Arc<CounterVec>),
    Gauge(Arc<GaugeVec>),
    Summary(Arc<SummaryVec>),
}

struct TemplateInner {
    kind: MetricKind,
    vec: VecHandle,
    registered: AtomicBool,
    warned_unregistered: AtomicBool,
}

/// A named, typed metric definition with a fixed label schema.
///
/// Created once, registered into a registry immediately after, reused by
/// arbitrarily many callers; clones share the backend vector and the
/// `registered` flag.
#[derive(Clone)]
pub struct MetricTemplate {
    inner: Arc<TemplateInner>,
}

impl MetricTemplate {
    /// A counter template. Constant labels are snapshotted from the current
    /// global labels; `metricType` is appended to `label_names`.
    pub fn counter(opts: Opts, label_names: &[&str]) -> Self {
        Self::counter_with_const_labels(opts, label_names, &get_global_labels())
    }

    /// A counter template with an explicit constant-label snapshot.
    pub fn counter_with_const_labels(
        opts: Opts,
        label_names: &[&str],
        const_labels: &LabelMap,
    ) -> Self {
        let names = with_metric_type(label_names);
        let vec = CounterVec::new(opts, &names, to_metric_label_values(const_labels));
        Self::from_parts(MetricKind::Counter, VecHandle::Counter(Arc::new(vec)))
    }

    /// A gauge template. Constant labels are snapshotted from the current
    /// global labels; `metricType` is appended to `label_names`.
    pub fn gauge(opts: Opts, label_names: &[&str]) -> Self {
        Self::gauge_with_const_labels(opts, label_names, &get_global_labels())
    }

    /// A gauge template with an explicit constant-label snapshot.
    pub fn gauge_with_const_labels(
        opts: Opts,
        label_names: &[&str],
        const_labels: &LabelMap,
    ) -> Self {
        let names = with_metric_type(label_names);
        let vec = GaugeVec::new(opts, &names, to_metric_label_values(const_labels));
        Self::from_parts(MetricKind::Gauge, VecHandle::Gauge(Arc::new(vec)))
    }

    /// A summary template with the default quantile objectives. Constant
    /// labels are snapshotted from the current global labels; `metricType` is
    /// appended to `label_names`.
    pub fn summary(opts: Opts, label_names: &[&str]) -> Self {
        Self::summary_with_const_labels(opts, label_names, &get_global_labels())
    }

    /// A summary template with an explicit constant-label snapshot.
    pub fn summary_with_const_labels(
        opts: Opts,
        label_names: &[&str],
        const_labels: &LabelMap,
    ) -> Self {
        let names = with_metric_type(label_names);
        let vec = SummaryVec::new(opts, &names, to_metric_label_values(const_labels));
        Self::from_parts(MetricKind::Summary, VecHandle::Summary(Arc::new(vec)))
    }

    fn from_parts(kind: MetricKind, vec: VecHandle) -> Self {
        Self {
            inner: Arc::new(TemplateInner {
                kind,
                vec,
                registered: AtomicBool::new(false),
                warned_unregistered: AtomicBool::new(false),
            }),
        }
    }

    /// The template's fully-qualified metric name.
    pub fn fq_name(&self) -> &str {
        &self.desc().name
    }

    /// The declared label names, including the implicit `metricType`.
    pub fn label_names(&self) -> &[String] {
        &self.desc().label_names
    }

    /// The template's kind.
    pub fn kind(&self) -> MetricKind {
        self.inner.kind
    }

    /// Whether registration into a registry succeeded.
    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Ordering::Acquire)
    }

    fn desc(&self) -> &super::backend::MetricDesc {
        match &self.inner.vec {
            VecHandle::Counter(vec) => vec.desc(),
            VecHandle::Gauge(vec) => vec.desc(),
            VecHandle::Summary(vec) => vec.desc(),
        }
    }

    /// Register the template's backend vector into `registry`.
    ///
    /// `None` means the global registry was never initialized; like a name
    /// collision it is logged as a warning and the template remains usable,
    /// its series just are not exposed. Never fatal.
    pub fn register(&self, registry: Option<&MetricRegistry>) {
        let Some(registry) = registry else {
            warn!(
                template = %self,
                "failed to register template: registry not initialized - was init_metrics() called?"
            );
            return;
        };

        let collector = match &self.inner.vec {
            VecHandle::Counter(vec) => Collector::Counter(vec.clone()),
            VecHandle::Gauge(vec) => Collector::Gauge(vec.clone()),
            VecHandle::Summary(vec) => Collector::Summary(vec.clone()),
        };

        match registry.register(collector) {
            Ok(()) => self.inner.registered.store(true, Ordering::Release),
            Err(err) => {
                warn!(template = %self, error = %err, "failed to register template into registry");
            }
        }
    }

    /// A counter instance bound to the given label values.
    ///
    /// The `metricType` label is filled in automatically; every other
    /// declared label must be present in `labels`. Identical label values
    /// yield the same handle, always.
    ///
    /// # Panics
    ///
    /// Panics when the template is not a counter, or when a declared label is
    /// missing from `labels`. Both are programmer errors.
    pub fn counter_instance(&self, labels: &LabelMap) -> CounterHandle {
        self.warn_if_unregistered();
        match &self.inner.vec {
            VecHandle::Counter(vec) => vec.with_label_values(&self.label_values(labels)),
            _ => panic!(
                "counter_instance() invoked on {} but the metric kind is {}",
                self, self.inner.kind
            ),
        }
    }

    /// A gauge instance bound to the given label values.
    ///
    /// # Panics
    ///
    /// Panics when the template is not a gauge, or when a declared label is
    /// missing from `labels`.
    pub fn gauge_instance(&self, labels: &LabelMap) -> GaugeHandle {
        self.warn_if_unregistered();
        match &self.inner.vec {
            VecHandle::Gauge(vec) => vec.with_label_values(&self.label_values(labels)),
            _ => panic!(
                "gauge_instance() invoked on {} but the metric kind is {}",
                self, self.inner.kind
            ),
        }
    }

    /// A summary instance bound to the given label values.
    ///
    /// # Panics
    ///
    /// Panics when the template is not a summary, or when a declared label is
    /// missing from `labels`.
    pub fn summary_instance(&self, labels: &LabelMap) -> SummaryHandle {
        self.warn_if_unregistered();
        match &self.inner.vec {
            VecHandle::Summary(vec) => vec.with_label_values(&self.label_values(labels)),
            _ => panic!(
                "summary_instance() invoked on {} but the metric kind is {}",
                self, self.inner.kind
            ),
        }
    }

    /// Order the caller's labels by the declared names, stringified, with
    /// `metricType` filled in from the kind.
    fn label_values(&self, labels: &LabelMap) -> Vec<String> {
        let values = to_metric_label_values(labels);
        self.desc()
            .label_names
            .iter()
            .map(|name| {
                if name == METRIC_TYPE_LABEL {
                    self.inner.kind.as_str().to_string()
                } else {
                    values.get(name).cloned().unwrap_or_else(|| {
                        panic!("{} instance is missing the declared label `{name}`", self)
                    })
                }
            })
            .collect()
    }

    fn warn_if_unregistered(&self) {
        if self.is_registered() {
            return;
        }
        if !self.inner.warned_unregistered.swap(true, Ordering::AcqRel) {
            warn!(
                template = %self,
                "metric instance requested but this template was never registered"
            );
        }
    }
}

impl fmt::Display for MetricTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetricTemplate[metricType: {}, name: {}]",
            self.inner.kind,
            self.fq_name()
        )
    }
}

fn with_metric_type(label_names: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = label_names.iter().map(|s| s.to_string()).collect();
    names.push(METRIC_TYPE_LABEL.to_string());
    names
}
