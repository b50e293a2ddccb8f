//! Vector-shaped metric primitives
//!
//! The backend boundary of the facade: named counter/gauge/summary vectors
//! that hand out one independently-observable handle per label-value
//! combination. Handles are created lazily with atomic get-or-create
//! semantics, so two racing threads asking for the same combination always
//! end up observing the same handle.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Default summary quantile objectives.
pub const DEFAULT_QUANTILES: &[f64] = &[0.0, 0.5, 0.95, 0.99, 1.0];

/// Observations kept per summary child for quantile estimation.
const SUMMARY_WINDOW: usize = 512;

/// Name, help and label schema of a metric vector.
#[derive(Debug, Clone)]
pub struct MetricDesc {
    /// Fully-qualified metric name
    pub name: String,
    /// Help text describing the metric
    pub help: String,
    /// Declared label names every combination must bind, in order
    pub label_names: Vec<String>,
    /// Constant labels stamped on every child of this vector
    pub const_labels: BTreeMap<String, String>,
}

/// Name components of a metric vector.
#[derive(Debug, Clone, Default)]
pub struct Opts {
    /// Optional namespace prefix
    pub namespace: String,
    /// Optional subsystem prefix
    pub subsystem: String,
    /// Metric name (required)
    pub name: String,
    /// Help text
    pub help: String,
}

impl Opts {
    /// Options with just a name and help text.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            subsystem: String::new(),
            name: name.into(),
            help: help.into(),
        }
    }

    /// Set the namespace prefix.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the subsystem prefix.
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// The fully-qualified name: non-empty parts joined with `_`.
    pub fn fq_name(&self) -> String {
        [&self.namespace, &self.subsystem, &self.name]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }
}

fn desc(opts: Opts, label_names: &[String], const_labels: BTreeMap<String, String>) -> MetricDesc {
    MetricDesc {
        name: opts.fq_name(),
        help: opts.help,
        label_names: label_names.to_vec(),
        const_labels,
    }
}

/// A monotonically increasing counter for one label combination.
#[derive(Debug, Clone, Default)]
pub struct CounterHandle {
    value: Arc<AtomicU64>,
}

impl CounterHandle {
    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment by `delta`.
    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Whether two handles address the same underlying time series.
    pub fn same_series(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A counter vector: one [`CounterHandle`] per label-value combination.
#[derive(Debug)]
pub struct CounterVec {
    desc: MetricDesc,
    children: RwLock<HashMap<Vec<String>, CounterHandle>>,
}

impl CounterVec {
    /// Create a counter vector with the given label schema and constant labels.
    pub fn new(opts: Opts, label_names: &[String], const_labels: BTreeMap<String, String>) -> Self {
        Self {
            desc: desc(opts, label_names, const_labels),
            children: RwLock::new(HashMap::new()),
        }
    }

    /// The vector's descriptor.
    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    /// The handle for the given label values, created on first use.
    ///
    /// # Panics
    ///
    /// Panics when the number of values differs from the declared label names;
    /// that is a programmer error, not a runtime condition.
    pub fn with_label_values(&self, values: &[String]) -> CounterHandle {
        check_arity(&self.desc, values);

        // Fast path: the combination already exists.
        {
            let children = self.children.read();
            if let Some(handle) = children.get(values) {
                return handle.clone();
            }
        }

        // Slow path: re-check under the write lock so racing creators
        // converge on one handle.
        let mut children = self.children.write();
        children.entry(values.to_vec()).or_default().clone()
    }

    /// Snapshot of every (label values, counter value) pair.
    pub fn collect(&self) -> Vec<(Vec<String>, u64)> {
        let children = self.children.read();
        children
            .iter()
            .map(|(values, handle)| (values.clone(), handle.value()))
            .collect()
    }
}

/// A gauge for one label combination; can move in both directions.
#[derive(Debug, Clone, Default)]
pub struct GaugeHandle {
    value: Arc<AtomicI64>,
}

impl GaugeHandle {
    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Decrement by 1.
    pub fn dec(&self) {
        self.add(-1);
    }

    /// Add `delta` (may be negative).
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Set to an absolute value.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Current value.
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Whether two handles address the same underlying time series.
    pub fn same_series(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A gauge vector: one [`GaugeHandle`] per label-value combination.
#[derive(Debug)]
pub struct GaugeVec {
    desc: MetricDesc,
    children: RwLock<HashMap<Vec<String>, GaugeHandle>>,
}

impl GaugeVec {
    /// Create a gauge vector with the given label schema and constant labels.
    pub fn new(opts: Opts, label_names: &[String], const_labels: BTreeMap<String, String>) -> Self {
        Self {
            desc: desc(opts, label_names, const_labels),
            children: RwLock::new(HashMap::new()),
        }
    }

    /// The vector's descriptor.
    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    /// The handle for the given label values, created on first use.
    ///
    /// # Panics
    ///
    /// Panics when the number of values differs from the declared label names.
    pub fn with_label_values(&self, values: &[String]) -> GaugeHandle {
        check_arity(&self.desc, values);

        {
            let children = self.children.read();
            if let Some(handle) = children.get(values) {
                return handle.clone();
            }
        }

        let mut children = self.children.write();
        children.entry(values.to_vec()).or_default().clone()
    }

    /// Snapshot of every (label values, gauge value) pair.
    pub fn collect(&self) -> Vec<(Vec<String>, i64)> {
        let children = self.children.read();
        children
            .iter()
            .map(|(values, handle)| (values.clone(), handle.value()))
            .collect()
    }
}

#[derive(Debug, Default)]
struct SummaryState {
    count: u64,
    sum: f64,
    window: VecDeque<f64>,
}

/// A summary observer for one label combination.
///
/// Tracks a cumulative count and sum, plus a bounded window of recent
/// observations from which quantiles are estimated at collection time.
#[derive(Debug, Clone, Default)]
pub struct SummaryHandle {
    state: Arc<Mutex<SummaryState>>,
}

impl SummaryHandle {
    /// Record one observation.
    pub fn observe(&self, value: f64) {
        let mut state = self.state.lock();
        state.count += 1;
        state.sum += value;
        if state.window.len() == SUMMARY_WINDOW {
            state.window.pop_front();
        }
        state.window.push_back(value);
    }

    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Sum of all observations.
    pub fn sum(&self) -> f64 {
        self.state.lock().sum
    }

    /// Estimated values for the given quantiles, from the current window.
    ///
    /// An empty window yields `NaN` for every quantile, matching exposition
    /// conventions for summaries with no data.
    pub fn quantiles(&self, quantiles: &[f64]) -> Vec<(f64, f64)> {
        let state = self.state.lock();
        let mut sorted: Vec<f64> = state.window.iter().copied().collect();
        drop(state);
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        quantiles
            .iter()
            .map(|&q| {
                let value = if sorted.is_empty() {
                    f64::NAN
                } else {
                    let rank = ((sorted.len() - 1) as f64 * q).round() as usize;
                    sorted[rank.min(sorted.len() - 1)]
                };
                (q, value)
            })
            .collect()
    }

    /// Whether two handles address the same underlying time series.
    pub fn same_series(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Snapshot of one summary child, for exposition.
#[derive(Debug, Clone)]
pub struct SummarySnapshot {
    /// Label values of the child
    pub label_values: Vec<String>,
    /// (quantile, estimated value) pairs
    pub quantiles: Vec<(f64, f64)>,
    /// Sum of all observations
    pub sum: f64,
    /// Total number of observations
    pub count: u64,
}

/// A summary vector: one [`SummaryHandle`] per label-value combination.
#[derive(Debug)]
pub struct SummaryVec {
    desc: MetricDesc,
    quantiles: Vec<f64>,
    children: RwLock<HashMap<Vec<String>, SummaryHandle>>,
}

impl SummaryVec {
    /// Create a summary vector with the default quantile objectives.
    pub fn new(opts: Opts, label_names: &[String], const_labels: BTreeMap<String, String>) -> Self {
        Self {
            desc: desc(opts, label_names, const_labels),
            quantiles: DEFAULT_QUANTILES.to_vec(),
            children: RwLock::new(HashMap::new()),
        }
    }

    /// The vector's descriptor.
    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    /// The quantile objectives reported for this vector.
    pub fn objectives(&self) -> &[f64] {
        &self.quantiles
    }

    /// The handle for the given label values, created on first use.
    ///
    /// # Panics
    ///
    /// Panics when the number of values differs from the declared label names.
    pub fn with_label_values(&self, values: &[String]) -> SummaryHandle {
        check_arity(&self.desc, values);

        {
            let children = self.children.read();
            if let Some(handle) = children.get(values) {
                return handle.clone();
            }
        }

        let mut children = self.children.write();
        children.entry(values.to_vec()).or_default().clone()
    }

    /// Snapshot of every summary child.
    pub fn collect(&self) -> Vec<SummarySnapshot> {
        let children = self.children.read();
        children
            .iter()
            .map(|(values, handle)| SummarySnapshot {
                label_values: values.clone(),
                quantiles: handle.quantiles(&self.quantiles),
                sum: handle.sum(),
                count: handle.count(),
            })
            .collect()
    }
}

fn check_arity(desc: &MetricDesc, values: &[String]) {
    assert!(
        values.len() == desc.label_names.len(),
        "metric `{}` expects {} label values ({:?}), got {}",
        desc.name,
        desc.label_names.len(),
        desc.label_names,
        values.len()
    );
}
