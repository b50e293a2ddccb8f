//! Global label context
//!
//! Process-wide key/value pairs identifying the running instance: service
//! name and version, host, instance id. They are derived from the environment
//! once at startup and fanned out to both the logging and metrics sides.
//!
//! Metric templates read the context at the moment they are created and keep
//! that snapshot as their constant labels. Replacing the global labels after
//! templates exist does **not** retroactively update them; this is a
//! documented limitation of the snapshot model, not a bug.

use std::env;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::labels::{LabelMap, LabelValue};

/// The process-wide label set. Unset until [`set_global_labels`] is called
/// (conventionally exactly once, during initialization).
static GLOBAL_LABELS: RwLock<Option<Arc<LabelMap>>> = RwLock::new(None);

/// Placeholder used for identity fields absent from the environment.
const UNKNOWN: &str = "?";

/// Build the default global label set from the environment.
///
/// # Environment Variables
///
/// - `SERVICE_NAME` (fallback `CONTAINER_NAME`) → `serviceName`
/// - `SERVICE_VERSION` (fallback `CONTAINER_VERSION`) → `serviceVer`
/// - `HOSTNAME` → `host`
/// - `INSTANCE_ID` → `instId`
///
/// Every field falls back to `"?"` when absent. Pure function of the
/// environment; nothing is cached here.
pub fn build_global_labels() -> LabelMap {
    let mut labels = LabelMap::new();

    labels.insert(
        "serviceName".into(),
        LabelValue::Text(env_or("SERVICE_NAME", Some("CONTAINER_NAME"))),
    );
    labels.insert(
        "serviceVer".into(),
        LabelValue::Text(env_or("SERVICE_VERSION", Some("CONTAINER_VERSION"))),
    );
    labels.insert("host".into(), LabelValue::Text(env_or("HOSTNAME", None)));
    labels.insert("instId".into(), LabelValue::Text(env_or("INSTANCE_ID", None)));

    labels
}

fn env_or(key: &str, fallback_key: Option<&str>) -> String {
    non_empty(env::var(key).ok())
        .or_else(|| fallback_key.and_then(|k| non_empty(env::var(k).ok())))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Replace the process-wide global labels wholesale.
///
/// Intended usage is write-once during startup, though replacement at any
/// time is permitted. Templates created before the replacement keep their
/// snapshot (see module docs).
pub fn set_global_labels(labels: LabelMap) {
    *GLOBAL_LABELS.write() = Some(Arc::new(labels));
}

/// The current global labels. Empty until [`set_global_labels`] was called.
///
/// Returns a cheap snapshot; concurrent replacement never tears a read.
pub fn get_global_labels() -> Arc<LabelMap> {
    GLOBAL_LABELS
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(LabelMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // All environment scenarios live in one test: the test harness runs tests
    // in parallel and these variables are process-global.
    #[test]
    fn test_build_global_labels_env_chain() {
        let vars = [
            "SERVICE_NAME",
            "CONTAINER_NAME",
            "SERVICE_VERSION",
            "CONTAINER_VERSION",
            "HOSTNAME",
            "INSTANCE_ID",
        ];
        for var in vars {
            env::remove_var(var);
        }

        // Nothing set: every field is the placeholder.
        let labels = build_global_labels();
        for key in ["serviceName", "serviceVer", "host", "instId"] {
            assert_eq!(labels[key], LabelValue::Text("?".into()), "key {key}");
        }

        // Primary name wins.
        env::set_var("SERVICE_NAME", "payments");
        let labels = build_global_labels();
        assert_eq!(labels["serviceName"], LabelValue::Text("payments".into()));

        // Fallback name is used when the primary is absent.
        env::remove_var("SERVICE_NAME");
        env::set_var("CONTAINER_NAME", "payments-container");
        let labels = build_global_labels();
        assert_eq!(
            labels["serviceName"],
            LabelValue::Text("payments-container".into())
        );

        // Primary shadows the fallback when both are present.
        env::set_var("SERVICE_NAME", "payments");
        let labels = build_global_labels();
        assert_eq!(labels["serviceName"], LabelValue::Text("payments".into()));

        // Remaining fields resolve independently.
        env::set_var("HOSTNAME", "node-7");
        env::set_var("INSTANCE_ID", "i-0ab3");
        let labels = build_global_labels();
        assert_eq!(labels["host"], LabelValue::Text("node-7".into()));
        assert_eq!(labels["instId"], LabelValue::Text("i-0ab3".into()));
        assert_eq!(labels["serviceVer"], LabelValue::Text("?".into()));

        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_set_and_get_are_snapshots() {
        // The metrics bootstrap installs env-derived labels exactly once;
        // force it to happen before this test's own set/get sequence.
        crate::metrics::init_metrics();

        let first = crate::labels! { "serviceName" => "a" };
        set_global_labels(first);
        let snapshot = get_global_labels();

        set_global_labels(crate::labels! { "serviceName" => "b" });

        // The earlier snapshot is unaffected by the replacement.
        assert_eq!(snapshot["serviceName"], LabelValue::Text("a".into()));
        assert_eq!(
            get_global_labels()["serviceName"],
            LabelValue::Text("b".into())
        );
    }
}
