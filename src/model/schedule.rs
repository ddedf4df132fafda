//! Collection schedules.

use serde::{Deserialize, Deserializer};

use crate::model::fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted};
use crate::model::pattern::Pattern;
use crate::model::period::CollectionPeriod;

/// What to collect and how often.
///
/// A metric is collected under a schedule if it matches at least one
/// inclusion pattern (an empty inclusion list matches everything) and no
/// exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct Schedule {
    #[serde(default)]
    pub inclusion_patterns: Vec<Pattern>,

    #[serde(default)]
    pub exclusion_patterns: Vec<Pattern>,

    pub period: CollectionPeriod,

    /// Opaque bytes passed through to the client.
    #[serde(default, deserialize_with = "metadata_from_text")]
    pub metadata: Option<Vec<u8>>,
}

impl Schedule {
    /// A schedule collecting everything at `period`.
    pub fn new(period: CollectionPeriod) -> Self {
        Self {
            inclusion_patterns: Vec::new(),
            exclusion_patterns: Vec::new(),
            period,
            metadata: None,
        }
    }

    pub fn include(mut self, pattern: Pattern) -> Self {
        self.inclusion_patterns.push(pattern);
        self
    }

    pub fn exclude(mut self, pattern: Pattern) -> Self {
        self.exclusion_patterns.push(pattern);
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Returns true if the metric `name` is collected under this schedule.
    pub fn collects(&self, name: &str) -> bool {
        let included = self.inclusion_patterns.is_empty()
            || self.inclusion_patterns.iter().any(|p| p.matches(name));

        included && !self.exclusion_patterns.iter().any(|p| p.matches(name))
    }
}

impl Fingerprinted for Schedule {
    fn fingerprint(&self) -> Fingerprint {
        let inclusion =
            Fingerprint::combine_unordered(self.inclusion_patterns.iter().map(Pattern::fingerprint));
        let exclusion =
            Fingerprint::combine_unordered(self.exclusion_patterns.iter().map(Pattern::fingerprint));

        // Role labels keep inclusion and exclusion sets distinguishable.
        let mut hasher = FingerprintHasher::new();
        hasher
            .label("inclusion")
            .fingerprint(&inclusion)
            .label("exclusion")
            .fingerprint(&exclusion)
            .label("period")
            .fingerprint(&self.period.fingerprint());

        match &self.metadata {
            Some(metadata) => hasher.label("metadata").bytes(metadata),
            None => hasher.label("no-metadata"),
        };

        hasher.finish()
    }
}

fn metadata_from_text<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    Ok(text.map(String::into_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_from_yaml() {
        let yaml = r#"
            Period: MIN_5
            InclusionPatterns:
              - StartsWith: /my/
            ExclusionPatterns:
              - Equals: /my/secret
            Metadata: opaque
        "#;
        let schedule: Schedule = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(schedule.period.seconds(), 300);
        assert_eq!(schedule.inclusion_patterns, vec![Pattern::starts_with("/my/")]);
        assert_eq!(schedule.exclusion_patterns, vec![Pattern::equals("/my/secret")]);
        assert_eq!(schedule.metadata.as_deref(), Some(&b"opaque"[..]));
    }

    #[test]
    fn test_unknown_schedule_field_rejected() {
        let err = serde_yaml::from_str::<Schedule>("Period: MIN_5\nPeriodd: MIN_1").unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{}", err);
    }

    #[test]
    fn test_collects() {
        let schedule = Schedule::new(CollectionPeriod::Min1)
            .include(Pattern::starts_with("/my/"))
            .exclude(Pattern::equals("/my/secret"));

        assert!(schedule.collects("/my/metric"));
        assert!(!schedule.collects("/my/secret"));
        assert!(!schedule.collects("/other"));

        let everything = Schedule::new(CollectionPeriod::Min1).exclude(Pattern::starts_with("/tmp"));
        assert!(everything.collects("/anything"));
        assert!(!everything.collects("/tmp/x"));
    }

    #[test]
    fn test_pattern_order_is_irrelevant() {
        let a = Schedule::new(CollectionPeriod::Sec1)
            .include(Pattern::equals("woot"))
            .include(Pattern::starts_with("yay"));
        let b = Schedule::new(CollectionPeriod::Sec1)
            .include(Pattern::starts_with("yay"))
            .include(Pattern::equals("woot"));

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_swapping_inclusion_and_exclusion_changes_fingerprint() {
        let included = Schedule::new(CollectionPeriod::Sec1)
            .include(Pattern::equals("woot"))
            .include(Pattern::starts_with("yay"));
        let excluded = Schedule::new(CollectionPeriod::Sec1)
            .exclude(Pattern::equals("woot"))
            .exclude(Pattern::starts_with("yay"));

        assert_ne!(included.fingerprint(), excluded.fingerprint());

        let both = Schedule::new(CollectionPeriod::Sec1)
            .include(Pattern::equals("a"))
            .exclude(Pattern::equals("b"));
        let swapped = Schedule::new(CollectionPeriod::Sec1)
            .include(Pattern::equals("b"))
            .exclude(Pattern::equals("a"));

        assert_ne!(both.fingerprint(), swapped.fingerprint());
    }

    #[test]
    fn test_period_and_metadata_affect_fingerprint() {
        let base = Schedule::new(CollectionPeriod::Min1);

        assert_ne!(base.fingerprint(), Schedule::new(CollectionPeriod::Min5).fingerprint());
        assert_ne!(base.fingerprint(), base.clone().with_metadata("x").fingerprint());
        assert_ne!(
            base.clone().with_metadata("").fingerprint(),
            base.fingerprint()
        );
    }
}
