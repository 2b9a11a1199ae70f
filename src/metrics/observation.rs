//! Observations produced by one collection run.

use std::collections::BTreeMap;

/// Label name used for every source metric.
pub const MOUNTPOINT_LABEL: &str = "mountpoint";

/// Label name to value mapping. Sorted, so rendering is deterministic.
pub type LabelSet = BTreeMap<String, String>;

/// One sample of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub metric: &'static str,
    pub labels: LabelSet,
    pub value: u64,
}

impl Observation {
    pub fn new(metric: &'static str, value: u64) -> Self {
        Self {
            metric,
            labels: LabelSet::new(),
            value,
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }
}

/// Every observation of one run, stamped with the single instant the run
/// started at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub observations: Vec<Observation>,
}

impl CollectionResult {
    pub fn new(timestamp_ms: i64, observations: Vec<Observation>) -> Self {
        Self {
            timestamp_ms,
            observations,
        }
    }

    /// Observations for `metric`, in production order.
    pub fn observations_for<'a>(
        &'a self,
        metric: &'a str,
    ) -> impl Iterator<Item = &'a Observation> + 'a {
        self.observations.iter().filter(move |o| o.metric == metric)
    }
}
