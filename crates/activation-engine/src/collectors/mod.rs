//! Rule collectors
//!
//! Each collector turns one slice of the activation configuration into plan
//! candidates. The set is closed, so it is a sum type rather than a trait:
//!
//! - [`DirectCollector`]: an explicit item list
//! - [`TriggerCollector`]: items bound to an external event and priority
//! - [`PredicateCollector`]: items gated on a field/operator/value condition
//! - [`EnvironmentCollector`]: items of the group matching the current environment
//!
//! Collectors are built once from typed configuration and hold no other
//! state; anything external (field values, environment identity) is read
//! fresh through the [`CollectContext`] on every call.

pub mod direct;
pub mod environment;
pub mod predicate;
pub mod trigger;

pub use direct::DirectCollector;
pub use environment::{EnvironmentCollector, EnvironmentGroup};
pub use predicate::{PredicateCollector, PredicateRule, RuleOperator};
pub use trigger::{TriggerCollector, TriggerRule};

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::lookup::{EnvironmentIdentity, FieldLookup};
use crate::normalize::{json_type, nested_list, Normalizer};
use activation_types::{defaults, CollectedItem, CollectorKind, ItemOrigin, ItemSpec};
use serde_json::{Map, Value};

/// External lookups available while collecting
#[derive(Clone, Copy)]
pub struct CollectContext<'a> {
    pub fields: &'a dyn FieldLookup,
    pub environment: &'a dyn EnvironmentIdentity,
    pub diagnostics: &'a dyn DiagnosticsSink,
}

/// Shape an identifier must have to be accepted from an item list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierShape {
    suffix: String,
}

impl IdentifierShape {
    /// Require identifiers to end with `suffix`; an empty suffix accepts any
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Accept every non-empty identifier
    pub fn any() -> Self {
        Self::with_suffix("")
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn accepts(&self, identifier: &str) -> bool {
        !identifier.trim().is_empty() && identifier.ends_with(self.suffix.as_str())
    }
}

impl Default for IdentifierShape {
    fn default() -> Self {
        Self::with_suffix(defaults::ITEM_SUFFIX)
    }
}

/// One entry of a rule's item list, as found in configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEntry {
    Spec(ItemSpec),
    /// Entry without a usable identifier; keeps the JSON shape for diagnostics
    Unusable { shape: &'static str },
}

/// Parse a rule's item list. Items without their own `order` take `default_order`.
pub(crate) fn parse_item_entries(map: &Map<String, Value>, default_order: i64) -> Vec<ItemEntry> {
    let normalizer = Normalizer::with_default_order(default_order);
    nested_list(map)
        .map(|items| {
            items
                .iter()
                .map(|item| match normalizer.parse_entry(item) {
                    Some(spec) => ItemEntry::Spec(spec),
                    None => ItemEntry::Unusable {
                        shape: json_type(item),
                    },
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Turn presence-checked entries into collected items, reporting the rest
pub(crate) fn collect_entries(
    entries: &[ItemEntry],
    origin: &ItemOrigin,
    rule_label: &str,
    diagnostics: &dyn DiagnosticsSink,
) -> Vec<CollectedItem> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            ItemEntry::Spec(spec) => items.push(CollectedItem::new(origin.clone(), spec.clone())),
            ItemEntry::Unusable { shape } => diagnostics.record(Diagnostic::warning(
                DiagnosticCode::InvalidEntry,
                format!("{rule_label}: item entry without identifier dropped (got {shape})"),
            )),
        }
    }
    items
}

/// A rule collector
#[derive(Debug, Clone)]
pub enum Collector {
    Direct(DirectCollector),
    Trigger(TriggerCollector),
    Predicate(PredicateCollector),
    Environment(EnvironmentCollector),
}

impl Collector {
    pub fn kind(&self) -> CollectorKind {
        match self {
            Self::Direct(_) => CollectorKind::Direct,
            Self::Trigger(_) => CollectorKind::Trigger,
            Self::Predicate(_) => CollectorKind::Predicate,
            Self::Environment(_) => CollectorKind::Environment,
        }
    }

    /// Produce this collector's plan candidates, in configuration order
    pub fn collect(&self, ctx: &CollectContext<'_>) -> Vec<CollectedItem> {
        match self {
            Self::Direct(c) => c.collect(ctx),
            Self::Trigger(c) => c.collect(ctx),
            Self::Predicate(c) => c.collect(ctx),
            Self::Environment(c) => c.collect(ctx),
        }
    }
}

impl From<DirectCollector> for Collector {
    fn from(c: DirectCollector) -> Self {
        Self::Direct(c)
    }
}

impl From<TriggerCollector> for Collector {
    fn from(c: TriggerCollector) -> Self {
        Self::Trigger(c)
    }
}

impl From<PredicateCollector> for Collector {
    fn from(c: PredicateCollector) -> Self {
        Self::Predicate(c)
    }
}

impl From<EnvironmentCollector> for Collector {
    fn from(c: EnvironmentCollector) -> Self {
        Self::Environment(c)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::CollectContext;
    use crate::diagnostics::MemorySink;
    use crate::lookup::{MapFieldLookup, StaticEnvironment};

    pub struct Harness {
        pub fields: MapFieldLookup,
        pub environment: StaticEnvironment,
        pub sink: MemorySink,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                fields: MapFieldLookup::new(),
                environment: StaticEnvironment::new("https://example.test"),
                sink: MemorySink::new(),
            }
        }

        pub fn ctx(&self) -> CollectContext<'_> {
            CollectContext {
                fields: &self.fields,
                environment: &self.environment,
                diagnostics: &self.sink,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_shape() {
        let shape = IdentifierShape::default();
        assert!(shape.accepts("akismet/akismet.php"));
        assert!(!shape.accepts("akismet/readme.txt"));
        assert!(!shape.accepts(""));

        let any = IdentifierShape::any();
        assert!(any.accepts("anything"));
        assert!(!any.accepts("  "));
    }

    #[test]
    fn test_parse_item_entries_keeps_unusable_shape() {
        let rule = json!({"items": ["a.php", 7, {"file": "b.php", "order": 2}]});
        let entries = parse_item_entries(rule.as_object().unwrap(), 5);
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], ItemEntry::Spec(s) if s.order == 5));
        assert_eq!(entries[1], ItemEntry::Unusable { shape: "number" });
        assert!(matches!(&entries[2], ItemEntry::Spec(s) if s.order == 2));
    }

    #[test]
    fn test_missing_item_list_is_empty() {
        let rule = json!({"hook": "init"});
        assert!(parse_item_entries(rule.as_object().unwrap(), 0).is_empty());
    }
}
