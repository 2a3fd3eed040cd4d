//! Plan builder
//!
//! Runs every collector in a fixed order, concatenates their output and
//! stable-sorts it by `order` ascending. Entries with equal order keep their
//! concatenation order. The plan is a list: duplicate identifiers are kept
//! and reconciled independently.

use crate::collectors::{
    CollectContext, Collector, DirectCollector, EnvironmentCollector, IdentifierShape,
    PredicateCollector, TriggerCollector,
};
use crate::config::ActivationConfig;
use activation_types::{CollectedItem, CollectorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed collector order
const COLLECTOR_ORDER: [CollectorKind; 4] = [
    CollectorKind::Direct,
    CollectorKind::Trigger,
    CollectorKind::Predicate,
    CollectorKind::Environment,
];

/// Builds an ordered [`Plan`] from a list of collectors
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    collectors: Vec<Collector>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One collector per configuration section, in the fixed collector order
    pub fn from_config(config: &ActivationConfig, shape: &IdentifierShape) -> Self {
        let mut builder = Self::new();
        for kind in COLLECTOR_ORDER {
            let collector: Collector = match kind {
                CollectorKind::Direct => {
                    DirectCollector::new(config.direct.clone(), shape.clone()).into()
                }
                CollectorKind::Trigger => TriggerCollector::new(config.triggers.clone()).into(),
                CollectorKind::Predicate => {
                    PredicateCollector::new(config.predicates.clone()).into()
                }
                CollectorKind::Environment => {
                    EnvironmentCollector::new(config.environments.clone(), shape.clone()).into()
                }
            };
            builder = builder.with_collector(collector);
        }
        builder
    }

    pub fn with_collector(mut self, collector: impl Into<Collector>) -> Self {
        self.collectors.push(collector.into());
        self
    }

    pub fn collectors(&self) -> &[Collector] {
        &self.collectors
    }

    /// Collect from every collector and merge into one ordered plan
    pub fn build(&self, ctx: &CollectContext<'_>) -> Plan {
        let mut items = Vec::new();
        for collector in &self.collectors {
            let collected = collector.collect(ctx);
            tracing::debug!(
                collector = %collector.kind(),
                count = collected.len(),
                "Collected plan candidates"
            );
            items.extend(collected);
        }
        Plan::new(items)
    }
}

/// Globally ordered list of plan candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    items: Vec<CollectedItem>,
}

impl Plan {
    /// Order `items` by their order key; ties keep their given order
    pub fn new(mut items: Vec<CollectedItem>) -> Self {
        // `sort_by_key` is stable
        items.sort_by_key(CollectedItem::order);
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[CollectedItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CollectedItem> {
        self.items.iter()
    }

    /// Every identifier appearing anywhere in the plan
    pub fn identifiers(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .map(|item| item.identifier())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Split into immediate and deferred entries, each in plan order
    pub fn partition(&self) -> (Vec<CollectedItem>, Vec<CollectedItem>) {
        self.items.iter().cloned().partition(|item| !item.spec.defer)
    }

    pub fn into_items(self) -> Vec<CollectedItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a CollectedItem;
    type IntoIter = std::slice::Iter<'a, CollectedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::test_support::Harness;
    use crate::diagnostics::MemorySink;
    use activation_types::{ItemOrigin, ItemSpec};
    use proptest::prelude::*;
    use serde_json::json;

    fn item(id: &str, order: i64) -> CollectedItem {
        CollectedItem::new(ItemOrigin::Direct, ItemSpec::new(id).with_order(order))
    }

    fn ids(plan: &Plan) -> Vec<&str> {
        plan.iter().map(|i| i.identifier()).collect()
    }

    #[test]
    fn test_equal_order_keeps_input_order() {
        let plan = Plan::new(vec![item("A", 1), item("B", 1)]);
        assert_eq!(ids(&plan), vec!["A", "B"]);
    }

    #[test]
    fn test_orders_ascending() {
        let plan = Plan::new(vec![item("x", 2), item("y", 1), item("z", -3)]);
        assert_eq!(ids(&plan), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let plan = Plan::new(vec![item("a", 0), item("a", 0)]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.identifiers().len(), 1);
    }

    #[test]
    fn test_partition_by_defer() {
        let mut deferred = item("late.php", 0);
        deferred.spec.defer = true;
        let plan = Plan::new(vec![item("a.php", 1), deferred, item("b.php", 2)]);

        let (immediate, deferred) = plan.partition();
        let immediate: Vec<_> = immediate.iter().map(|i| i.identifier()).collect();
        assert_eq!(immediate, vec!["a.php", "b.php"]);
        assert_eq!(deferred[0].identifier(), "late.php");
    }

    #[test]
    fn test_from_config_runs_collectors_in_fixed_order() {
        let sink = MemorySink::new();
        let config = ActivationConfig::from_value(
            &json!({
                "environments": {"prod": {"url": "https://example.test", "items": ["env.php"]}},
                "conditions": [{"field": "mode", "value": "live", "items": ["pred.php"]}],
                "hooks": [{"hook": "init", "items": ["hook.php"]}],
                "plugins": ["direct.php"]
            }),
            &sink,
        );
        let builder = PlanBuilder::from_config(&config, &IdentifierShape::default());
        let kinds: Vec<_> = builder.collectors().iter().map(Collector::kind).collect();
        assert_eq!(kinds, COLLECTOR_ORDER.to_vec());

        let harness = Harness::new();
        harness.fields.set("mode", "live");
        let plan = builder.build(&harness.ctx());
        // All collected at order 0, so concatenation order survives the sort
        assert_eq!(ids(&plan), vec!["direct.php", "hook.php", "pred.php", "env.php"]);
    }

    #[test]
    fn test_empty_builder_yields_empty_plan() {
        let harness = Harness::new();
        assert!(PlanBuilder::new().build(&harness.ctx()).is_empty());
    }

    proptest! {
        #[test]
        fn property_plan_sort_is_stable(orders in proptest::collection::vec(-3i64..3, 0..40)) {
            let input: Vec<_> = orders
                .iter()
                .enumerate()
                .map(|(i, order)| item(&format!("item-{i}"), *order))
                .collect();
            let plan = Plan::new(input);

            for pair in plan.items().windows(2) {
                prop_assert!(pair[0].order() <= pair[1].order());
                if pair[0].order() == pair[1].order() {
                    let a: usize = pair[0].identifier()[5..].parse().unwrap();
                    let b: usize = pair[1].identifier()[5..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}
