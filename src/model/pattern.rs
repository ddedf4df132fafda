//! Metric name patterns.
//!
//! A pattern is either an exact match or a prefix match. The schedule file
//! spells it as `{Equals: ...}` or `{StartsWith: ...}`; setting both is rejected.

use serde::Deserialize;

use crate::model::fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted};
use crate::model::ModelError;

/// A matching rule on a metric or span name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawPattern")]
pub enum Pattern {
    Equals(String),
    StartsWith(String),
}

impl Pattern {
    pub fn equals(name: impl Into<String>) -> Self {
        Pattern::Equals(name.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Pattern::StartsWith(prefix.into())
    }

    /// Returns true if `name` satisfies this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Equals(expected) => name == expected,
            Pattern::StartsWith(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

impl Fingerprinted for Pattern {
    fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher::new();
        match self {
            Pattern::Equals(value) => hasher.label("Equals").bytes(value.as_bytes()),
            Pattern::StartsWith(value) => hasher.label("StartsWith").bytes(value.as_bytes()),
        };
        hasher.finish()
    }
}

/// Pattern as written in the schedule file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPattern {
    #[serde(rename = "Equals", default)]
    equals: Option<String>,
    #[serde(rename = "StartsWith", default)]
    starts_with: Option<String>,
}

impl TryFrom<RawPattern> for Pattern {
    type Error = ModelError;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        match (raw.equals, raw.starts_with) {
            (Some(equals), None) => Ok(Pattern::Equals(equals)),
            (None, Some(starts_with)) => Ok(Pattern::StartsWith(starts_with)),
            (Some(equals), Some(starts_with)) => Err(ModelError::AmbiguousPattern {
                equals,
                starts_with,
            }),
            (None, None) => Err(ModelError::EmptyPattern),
        }
    }
}
