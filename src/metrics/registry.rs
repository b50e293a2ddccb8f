//! MetricRegistry - named collector table
//!
//! The registry is the boundary templates register into: a process-lifetime
//! table of named counter/gauge/summary vectors. Names are unique across all
//! three kinds; a collision is reported to the caller and otherwise harmless
//! (the colliding vector stays usable, it just is not exposed).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::backend::{CounterVec, GaugeVec, SummaryVec};
use crate::error::RegistryError;

/// A registered collector of any kind.
#[derive(Clone)]
pub enum Collector {
    Counter(Arc<CounterVec>),
    Gauge(Arc<GaugeVec>),
    Summary(Arc<SummaryVec>),
}

impl Collector {
    fn name(&self) -> &str {
        match self {
            Self::Counter(vec) => &vec.desc().name,
            Self::Gauge(vec) => &vec.desc().name,
            Self::Summary(vec) => &vec.desc().name,
        }
    }
}

/// Process-lifetime table of named metric vectors.
///
/// Applications normally use the global registry bootstrapped by
/// [`crate::metrics::init_metrics`]; tests and embedders can run their own.
#[derive(Default)]
pub struct MetricRegistry {
    collectors: RwLock<HashMap<String, Collector>>,
}

impl MetricRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector under its fully-qualified name.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when any collector of
    /// the same name exists, regardless of kind.
    pub fn register(&self, collector: Collector) -> Result<(), RegistryError> {
        let name = collector.name().to_string();
        let mut collectors = self.collectors.write();
        if collectors.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        collectors.insert(name, collector);
        Ok(())
    }

    /// Whether a collector with this name is registered.
    pub fn has_collector(&self, name: &str) -> bool {
        self.collectors.read().contains_key(name)
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.collectors.read().is_empty()
    }

    /// Snapshot of all collectors, name-sorted for deterministic exposition.
    pub fn collectors(&self) -> Vec<Collector> {
        let collectors = self.collectors.read();
        let mut snapshot: Vec<(String, Collector)> = collectors
            .iter()
            .map(|(name, collector)| (name.clone(), collector.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot.into_iter().map(|(_, collector)| collector).collect()
    }

    /// Render every registered collector in the Prometheus text format.
    pub fn gather(&self) -> String {
        super::exposition::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::backend::Opts;
    use std::collections::BTreeMap;

    fn counter(name: &str) -> Collector {
        Collector::Counter(Arc::new(CounterVec::new(
            Opts::new(name, "help"),
            &["of".to_string()],
            BTreeMap::new(),
        )))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = MetricRegistry::new();
        assert!(registry.is_empty());

        registry.register(counter("execCount")).unwrap();

        assert!(registry.has_collector("execCount"));
        assert!(!registry.has_collector("errorCount"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_name_collision_is_rejected() {
        let registry = MetricRegistry::new();
        registry.register(counter("execCount")).unwrap();

        let err = registry.register(counter("execCount")).unwrap_err();
        assert!(err.to_string().contains("execCount"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collision_across_kinds_is_rejected() {
        let registry = MetricRegistry::new();
        registry.register(counter("processingTime")).unwrap();

        let summary = Collector::Summary(Arc::new(SummaryVec::new(
            Opts::new("processingTime", "help"),
            &["of".to_string()],
            BTreeMap::new(),
        )));
        assert!(registry.register(summary).is_err());
    }

    #[test]
    fn test_collectors_are_name_sorted() {
        let registry = MetricRegistry::new();
        registry.register(counter("warningCount")).unwrap();
        registry.register(counter("errorCount")).unwrap();
        registry.register(counter("execCount")).unwrap();

        let names: Vec<String> = registry
            .collectors()
            .iter()
            .map(|c| match c {
                Collector::Counter(v) => v.desc().name.clone(),
                Collector::Gauge(v) => v.desc().name.clone(),
                Collector::Summary(v) => v.desc().name.clone(),
            })
            .collect();

        assert_eq!(names, vec!["errorCount", "execCount", "warningCount"]);
    }
}
