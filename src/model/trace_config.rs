//! Trace sampling configuration attached to a config block.

use serde::Deserialize;

use crate::model::fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted};
use crate::model::ModelError;

/// Sampling and span limits for traces.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct TraceConfig {
    #[serde(default)]
    pub sampler: Option<Sampler>,
    #[serde(default)]
    pub max_number_of_attributes: Option<u32>,
    #[serde(default)]
    pub max_number_of_timed_events: Option<u32>,
    #[serde(default)]
    pub max_number_of_attributes_per_timed_event: Option<u32>,
    #[serde(default)]
    pub max_number_of_links: Option<u32>,
    #[serde(default)]
    pub max_number_of_attributes_per_link: Option<u32>,
}

/// Span sampler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSampler")]
pub enum Sampler {
    Constant(ConstantDecision),
    /// Probability within `[0.0, 1.0]`.
    Probability(f64),
    /// Spans per second.
    RateLimiting(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstantDecision {
    AlwaysOff,
    AlwaysOn,
    AlwaysParent,
}

impl ConstantDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstantDecision::AlwaysOff => "ALWAYS_OFF",
            ConstantDecision::AlwaysOn => "ALWAYS_ON",
            ConstantDecision::AlwaysParent => "ALWAYS_PARENT",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct RawSampler {
    #[serde(default)]
    constant_sampler: Option<RawConstantSampler>,
    #[serde(default)]
    probability_sampler: Option<RawProbabilitySampler>,
    #[serde(default)]
    rate_limiting_sampler: Option<RawRateLimitingSampler>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct RawConstantSampler {
    decision: ConstantDecision,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct RawProbabilitySampler {
    probability: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct RawRateLimitingSampler {
    qps: u64,
}

impl TryFrom<RawSampler> for Sampler {
    type Error = ModelError;

    fn try_from(raw: RawSampler) -> Result<Self, Self::Error> {
        match (
            raw.constant_sampler,
            raw.probability_sampler,
            raw.rate_limiting_sampler,
        ) {
            (Some(constant), None, None) => Ok(Sampler::Constant(constant.decision)),
            (None, Some(probability), None) => {
                let p = probability.probability;
                if !(0.0..=1.0).contains(&p) {
                    return Err(ModelError::InvalidProbability(p));
                }
                Ok(Sampler::Probability(p))
            }
            (None, None, Some(rate)) => Ok(Sampler::RateLimiting(rate.qps)),
            _ => Err(ModelError::InvalidSampler),
        }
    }
}

impl Fingerprinted for Sampler {
    fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher::new();
        match self {
            Sampler::Constant(decision) => hasher.label("constant").label(decision.as_str()),
            Sampler::Probability(p) => hasher.label("probability").u64(p.to_bits()),
            Sampler::RateLimiting(qps) => hasher.label("rate_limiting").u64(*qps),
        };
        hasher.finish()
    }
}

impl Fingerprinted for TraceConfig {
    fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher::new();
        hasher.label("trace");

        match &self.sampler {
            Some(sampler) => hasher.label("sampler").fingerprint(&sampler.fingerprint()),
            None => hasher.label("no-sampler"),
        };

        let limits = [
            ("max_number_of_attributes", self.max_number_of_attributes),
            ("max_number_of_timed_events", self.max_number_of_timed_events),
            (
                "max_number_of_attributes_per_timed_event",
                self.max_number_of_attributes_per_timed_event,
            ),
            ("max_number_of_links", self.max_number_of_links),
            (
                "max_number_of_attributes_per_link",
                self.max_number_of_attributes_per_link,
            ),
        ];
        for (name, limit) in limits {
            if let Some(limit) = limit {
                hasher.label(name).u64(u64::from(limit));
            }
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_config_from_yaml() {
        let yaml = r#"
            Sampler:
              ProbabilitySampler:
                Probability: 0.25
            MaxNumberOfAttributes: 32
        "#;
        let config: TraceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sampler, Some(Sampler::Probability(0.25)));
        assert_eq!(config.max_number_of_attributes, Some(32));
        assert_eq!(config.max_number_of_links, None);

        let yaml = "Sampler: {ConstantSampler: {Decision: ALWAYS_PARENT}}";
        let config: TraceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.sampler,
            Some(Sampler::Constant(ConstantDecision::AlwaysParent))
        );
    }

    #[test]
    fn test_invalid_samplers_rejected() {
        assert!(serde_yaml::from_str::<TraceConfig>("Sampler: {}").is_err());
        assert!(serde_yaml::from_str::<TraceConfig>(
            "Sampler: {ProbabilitySampler: {Probability: 1.5}}"
        )
        .is_err());
        assert!(serde_yaml::from_str::<TraceConfig>(
            "Sampler: {RateLimitingSampler: {Qps: 5}, ProbabilitySampler: {Probability: 0.5}}"
        )
        .is_err());
    }

    #[test]
    fn test_trace_fingerprint() {
        let a = TraceConfig {
            sampler: Some(Sampler::RateLimiting(10)),
            ..Default::default()
        };
        let b = TraceConfig {
            sampler: Some(Sampler::RateLimiting(20)),
            ..Default::default()
        };
        let c = TraceConfig {
            max_number_of_links: Some(10),
            ..Default::default()
        };

        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(TraceConfig::default().fingerprint(), c.fingerprint());
    }
}
