//! Metric configuration: the schedules served to a client.

use serde::Deserialize;

use crate::model::fingerprint::{Fingerprint, Fingerprinted};
use crate::model::schedule::Schedule;

/// Ordered list of schedules.
///
/// Order is preserved for the client but does not affect the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct MetricConfig {
    pub schedules: Vec<Schedule>,
}

impl MetricConfig {
    pub fn new(schedules: Vec<Schedule>) -> Self {
        Self { schedules }
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Append another config's schedules after this one's.
    pub fn extend(&mut self, other: &MetricConfig) {
        self.schedules.extend(other.schedules.iter().cloned());
    }
}

impl Fingerprinted for MetricConfig {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::combine_unordered(self.schedules.iter().map(Schedule::fingerprint))
    }
}
