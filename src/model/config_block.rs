//! Config blocks and the loaded configuration aggregate.

use serde::Deserialize;

use crate::model::fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted};
use crate::model::metric_config::MetricConfig;
use crate::model::trace_config::TraceConfig;

/// Schedules and trace settings gated by resource requirements.
///
/// Each requirement is a `"key:value"` string. A block with no requirements
/// applies to every resource.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct ConfigBlock {
    #[serde(default)]
    pub resource: Vec<String>,

    #[serde(rename = "Schedules", default)]
    pub metric_config: MetricConfig,

    #[serde(default)]
    pub trace_config: Option<TraceConfig>,
}

impl ConfigBlock {
    /// A block that every resource satisfies.
    pub fn global(metric_config: MetricConfig) -> Self {
        Self {
            resource: Vec::new(),
            metric_config,
            trace_config: None,
        }
    }

    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trace_config(mut self, trace_config: TraceConfig) -> Self {
        self.trace_config = Some(trace_config);
        self
    }

    /// Fold `other` into this block.
    ///
    /// Schedules are appended in order; a trace config on `other` replaces ours.
    pub fn merge(&mut self, other: &ConfigBlock) {
        self.metric_config.extend(&other.metric_config);
        if let Some(trace_config) = &other.trace_config {
            self.trace_config = Some(trace_config.clone());
        }
    }
}

impl Fingerprinted for ConfigBlock {
    fn fingerprint(&self) -> Fingerprint {
        let metric = self.metric_config.fingerprint();
        match &self.trace_config {
            None => metric,
            Some(trace_config) => {
                let mut hasher = FingerprintHasher::new();
                hasher
                    .label("metric")
                    .fingerprint(&metric)
                    .label("trace")
                    .fingerprint(&trace_config.fingerprint());
                hasher.finish()
            }
        }
    }
}

/// Every block loaded from a backend's source of truth, unmatched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub blocks: Vec<ConfigBlock>,
}

impl Config {
    pub fn new(blocks: Vec<ConfigBlock>) -> Self {
        Self { blocks }
    }
}
