//! Logging boundary
//!
//! The logging backend accepts an ordered sequence of typed labels to attach
//! to every log record, and exposes a process-wide settable global label
//! list. This module is that boundary: it builds the default label list from
//! the environment-derived global context and stores whatever list the host
//! application installs.
//!
//! No formatting or sinks live here; the host wires [`global_log_labels`]
//! into whichever log layer it runs.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::build_global_labels;
use crate::labels::{to_loggable_labels, Label};

static GLOBAL_LOG_LABELS: RwLock<Option<Arc<Vec<Label>>>> = RwLock::new(None);

/// Build the default global log labels from the environment.
///
/// Equivalent to coercing [`build_global_labels`]
/// through [`to_loggable_labels`].
pub fn build_default_global_log_labels() -> Vec<Label> {
    to_loggable_labels(&build_global_labels())
}

/// Install the process-wide log label list.
pub fn set_global_log_labels(labels: Vec<Label>) {
    *GLOBAL_LOG_LABELS.write() = Some(Arc::new(labels));
}

/// The currently installed log label list; empty until
/// [`set_global_log_labels`] was called.
pub fn global_log_labels() -> Arc<Vec<Label>> {
    GLOBAL_LOG_LABELS
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_read_back() {
        set_global_log_labels(vec![
            Label::string("serviceName", "payments"),
            Label::float("instances", 3.0),
        ]);

        let labels = global_log_labels();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].key(), "serviceName");
        assert_eq!(labels[1].key(), "instances");
    }
}
