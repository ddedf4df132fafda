//! Config block selection and merging.

use std::collections::HashSet;

use crate::matching::resource::{normalize_label, Resource};
use crate::model::ConfigBlock;

/// Returns true if every requirement of `block` is among `labels`.
pub fn satisfies(labels: &HashSet<String>, block: &ConfigBlock) -> bool {
    block
        .resource
        .iter()
        .all(|requirement| labels.contains(&normalize_label(requirement)))
}

/// Merge the blocks `resource` satisfies, in order.
///
/// The merged block's `resource` lists the resource's own labels.
pub fn match_resource(resource: &Resource, blocks: &[ConfigBlock]) -> ConfigBlock {
    let labels = resource.label_set();

    let mut merged = ConfigBlock {
        resource: resource.labels(),
        ..Default::default()
    };
    for block in blocks.iter().filter(|block| satisfies(&labels, block)) {
        merged.merge(block);
    }
    merged
}

/// Merge every block regardless of requirements.
pub fn merge_all(blocks: &[ConfigBlock]) -> ConfigBlock {
    let mut merged = ConfigBlock::default();
    for block in blocks {
        merged.merge(block);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CollectionPeriod, Fingerprinted, MetricConfig, Schedule};

    fn block(requirements: &[&str], period: CollectionPeriod) -> ConfigBlock {
        ConfigBlock::global(MetricConfig::new(vec![Schedule::new(period)]))
            .with_requirements(requirements.iter().copied())
    }

    fn periods(block: &ConfigBlock) -> Vec<CollectionPeriod> {
        block.metric_config.schedules.iter().map(|s| s.period).collect()
    }

    fn orders() -> Resource {
        Resource::new()
            .with_attribute("service", "orders")
            .with_attribute("zone", "eu")
    }

    #[test]
    fn test_all_requirements_must_hold() {
        let blocks = vec![
            block(&["service:orders"], CollectionPeriod::Min1),
            block(&["service:orders", "zone:us"], CollectionPeriod::Min5),
            block(&[" zone : \"eu\" "], CollectionPeriod::Hr1),
            block(&[], CollectionPeriod::Day1),
        ];

        let merged = match_resource(&orders(), &blocks);
        assert_eq!(
            periods(&merged),
            vec![CollectionPeriod::Min1, CollectionPeriod::Hr1, CollectionPeriod::Day1]
        );
        assert_eq!(merged.resource, vec!["service:orders", "zone:eu"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let blocks = vec![block(&["service:billing"], CollectionPeriod::Min1)];
        let merged = match_resource(&orders(), &blocks);

        assert!(merged.metric_config.is_empty());
        assert!(merged.fingerprint().is_zero());
    }

    #[test]
    fn test_matching_is_idempotent() {
        let blocks = vec![
            block(&["service:orders"], CollectionPeriod::Min1),
            block(&[], CollectionPeriod::Sec30),
        ];

        let first = match_resource(&orders(), &blocks);
        let second = match_resource(&orders(), &blocks);
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_merge_all_ignores_requirements() {
        let blocks = vec![
            block(&["service:billing"], CollectionPeriod::Min1),
            block(&[], CollectionPeriod::Sec30),
        ];
        let merged = merge_all(&blocks);

        assert_eq!(periods(&merged), vec![CollectionPeriod::Min1, CollectionPeriod::Sec30]);
        assert!(merged.resource.is_empty());
    }
}
