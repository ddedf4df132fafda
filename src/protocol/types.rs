//! Request and response types.

use serde::{Deserialize, Serialize};

use crate::matching::Resource;
use crate::model::{
    ConfigBlock, ConstantDecision, Fingerprint, Fingerprinted, MetricConfig, Pattern, Sampler,
    Schedule, TraceConfig,
};
use crate::protocol::encoding::{base64_bytes, base64_bytes_opt};

/// One poll from a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigRequest {
    #[serde(default)]
    pub resource: Resource,

    /// Fingerprint of the last response the client applied. Empty on first poll.
    #[serde(with = "base64_bytes", default)]
    pub last_known_fingerprint: Vec<u8>,
}

impl ConfigRequest {
    pub fn new(resource: Resource, last_known_fingerprint: impl Into<Vec<u8>>) -> Self {
        Self {
            resource,
            last_known_fingerprint: last_known_fingerprint.into(),
        }
    }
}

/// Answer to a poll.
///
/// `metric_config` is only present on a cache miss.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(with = "base64_bytes", default)]
    pub fingerprint: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_config: Option<MetricConfigPayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_config: Option<TraceConfigPayload>,

    #[serde(default)]
    pub suggested_wait_time_seconds: i32,
}

impl ConfigResponse {
    /// Cache-hit reply: fingerprint only.
    pub fn unchanged(fingerprint: Vec<u8>, suggested_wait_time_seconds: i32) -> Self {
        Self {
            fingerprint,
            metric_config: None,
            trace_config: None,
            suggested_wait_time_seconds,
        }
    }

    /// Full reply for a merged block, fingerprint included.
    pub fn from_block(block: &ConfigBlock, suggested_wait_time_seconds: i32) -> Self {
        Self::from_parts(&block.fingerprint(), block, suggested_wait_time_seconds)
    }

    /// Full response for `block` using an already computed `fingerprint` of it.
    pub fn from_parts(fingerprint: &Fingerprint, block: &ConfigBlock, suggested_wait_time_seconds: i32) -> Self {
        Self {
            fingerprint: fingerprint.to_vec(),
            metric_config: Some(MetricConfigPayload::from(&block.metric_config)),
            trace_config: block.trace_config.as_ref().map(TraceConfigPayload::from),
            suggested_wait_time_seconds,
        }
    }

    pub fn is_full(&self) -> bool {
        self.metric_config.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricConfigPayload {
    #[serde(default)]
    pub schedules: Vec<SchedulePayload>,
}

impl From<&MetricConfig> for MetricConfigPayload {
    fn from(config: &MetricConfig) -> Self {
        Self {
            schedules: config.schedules.iter().map(SchedulePayload::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePayload {
    #[serde(default)]
    pub inclusion_patterns: Vec<PatternPayload>,

    #[serde(default)]
    pub exclusion_patterns: Vec<PatternPayload>,

    /// Period name (`MIN_5`) or numeric string.
    pub period: String,

    /// Resolved period in seconds.
    pub period_sec: u32,

    #[serde(
        with = "base64_bytes_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<Vec<u8>>,
}

impl From<&Schedule> for SchedulePayload {
    fn from(schedule: &Schedule) -> Self {
        Self {
            inclusion_patterns: schedule.inclusion_patterns.iter().map(PatternPayload::from).collect(),
            exclusion_patterns: schedule.exclusion_patterns.iter().map(PatternPayload::from).collect(),
            period: schedule.period.to_string(),
            period_sec: schedule.period.seconds(),
            metadata: schedule.metadata.clone(),
        }
    }
}

/// `{"equals": ...}` or `{"starts_with": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPayload {
    Equals(String),
    StartsWith(String),
}

impl From<&Pattern> for PatternPayload {
    fn from(pattern: &Pattern) -> Self {
        match pattern {
            Pattern::Equals(value) => PatternPayload::Equals(value.clone()),
            Pattern::StartsWith(value) => PatternPayload::StartsWith(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceConfigPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<SamplerPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_attributes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_timed_events: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_attributes_per_timed_event: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_links: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_attributes_per_link: Option<u32>,
}

impl From<&TraceConfig> for TraceConfigPayload {
    fn from(config: &TraceConfig) -> Self {
        Self {
            sampler: config.sampler.as_ref().map(SamplerPayload::from),
            max_number_of_attributes: config.max_number_of_attributes,
            max_number_of_timed_events: config.max_number_of_timed_events,
            max_number_of_attributes_per_timed_event: config
                .max_number_of_attributes_per_timed_event,
            max_number_of_links: config.max_number_of_links,
            max_number_of_attributes_per_link: config.max_number_of_attributes_per_link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerPayload {
    ConstantSampler { decision: DecisionPayload },
    ProbabilitySampler { probability: f64 },
    RateLimitingSampler { qps: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPayload {
    AlwaysOff,
    AlwaysOn,
    AlwaysParent,
}

impl From<&Sampler> for SamplerPayload {
    fn from(sampler: &Sampler) -> Self {
        match sampler {
            Sampler::Constant(decision) => SamplerPayload::ConstantSampler {
                decision: match decision {
                    ConstantDecision::AlwaysOff => DecisionPayload::AlwaysOff,
                    ConstantDecision::AlwaysOn => DecisionPayload::AlwaysOn,
                    ConstantDecision::AlwaysParent => DecisionPayload::AlwaysParent,
                },
            },
            Sampler::Probability(probability) => SamplerPayload::ProbabilitySampler {
                probability: *probability,
            },
            Sampler::RateLimiting(qps) => SamplerPayload::RateLimitingSampler { qps: *qps },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CollectionPeriod;

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "resource": [{"key": "service", "value": "orders"}],
            "last_known_fingerprint": "AAAA"
        }"#;
        let request: ConfigRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.resource.labels(), vec!["service:orders"]);
        assert_eq!(request.last_known_fingerprint, vec![0, 0, 0]);

        let empty: ConfigRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.last_known_fingerprint.is_empty());
        assert!(empty.resource.attributes.is_empty());
    }

    #[test]
    fn test_full_response_shape() {
        let schedule = Schedule::new(CollectionPeriod::Min5)
            .include(Pattern::starts_with("/my/"))
            .exclude(Pattern::equals("/my/secret"))
            .with_metadata("m");
        let block = ConfigBlock::global(MetricConfig::new(vec![schedule])).with_trace_config(
            TraceConfig {
                sampler: Some(Sampler::Constant(ConstantDecision::AlwaysOn)),
                ..Default::default()
            },
        );

        let response = ConfigResponse::from_block(&block, 30);
        assert!(response.is_full());
        assert_eq!(response.fingerprint, block.fingerprint().to_vec());

        let json = serde_json::to_value(&response).unwrap();
        let schedule = &json["metric_config"]["schedules"][0];
        assert_eq!(schedule["period"], "MIN_5");
        assert_eq!(schedule["period_sec"], 300);
        assert_eq!(schedule["inclusion_patterns"][0]["starts_with"], "/my/");
        assert_eq!(schedule["exclusion_patterns"][0]["equals"], "/my/secret");
        assert_eq!(schedule["metadata"], "bQ==");
        assert_eq!(
            json["trace_config"]["sampler"]["constant_sampler"]["decision"],
            "always_on"
        );
        assert_eq!(json["suggested_wait_time_seconds"], 30);
    }

    #[test]
    fn test_unchanged_response_omits_payload() {
        let response = ConfigResponse::unchanged(vec![1; 32], 30);
        assert!(!response.is_full());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("metric_config").is_none());
        assert!(json.get("trace_config").is_none());

        let decoded: ConfigResponse = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_empty_block_is_full_with_zero_fingerprint() {
        let response = ConfigResponse::from_block(&ConfigBlock::default(), 30);
        assert!(response.is_full());
        assert_eq!(response.fingerprint, vec![0u8; 32]);
        assert_eq!(response.metric_config.map(|m| m.schedules.len()), Some(0));
    }
}
