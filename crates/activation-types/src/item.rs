//! Collected plan items
//!
//! Collectors turn their slice of configuration into CollectedItems. The
//! origin travels with each item for routing and diagnostics only; it never
//! takes part in ordering.

use crate::spec::ItemSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The collector strategy that produced an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Direct,
    Environment,
    Trigger,
    Predicate,
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::Environment => "environment",
            Self::Trigger => "trigger",
            Self::Predicate => "predicate",
        };
        f.write_str(name)
    }
}

/// External event an item is associated with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerBinding {
    /// Event name
    pub name: String,

    /// Priority handed to the event system
    pub priority: i64,
}

/// Where a collected item came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemOrigin {
    /// Explicit item list
    Direct,

    /// Matched environment group
    Environment { group: String },

    /// Trigger rule
    Trigger(TriggerBinding),

    /// Predicate rule, named by the field it tested
    Predicate { field: String },
}

impl ItemOrigin {
    /// Collector kind for this origin
    pub fn kind(&self) -> CollectorKind {
        match self {
            Self::Direct => CollectorKind::Direct,
            Self::Environment { .. } => CollectorKind::Environment,
            Self::Trigger(_) => CollectorKind::Trigger,
            Self::Predicate { .. } => CollectorKind::Predicate,
        }
    }
}

/// A plan candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    /// Producing collector and its collector-specific fields
    pub origin: ItemOrigin,

    /// The item itself; `spec.order` is the merge sort key
    pub spec: ItemSpec,
}

impl CollectedItem {
    pub fn new(origin: ItemOrigin, spec: ItemSpec) -> Self {
        Self { origin, spec }
    }

    pub fn kind(&self) -> CollectorKind {
        self.origin.kind()
    }

    pub fn order(&self) -> i64 {
        self.spec.order
    }

    pub fn identifier(&self) -> &str {
        &self.spec.identifier
    }

    /// Trigger binding, for trigger-kind items
    pub fn trigger(&self) -> Option<&TriggerBinding> {
        match &self.origin {
            ItemOrigin::Trigger(binding) => Some(binding),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_kind() {
        let item = CollectedItem::new(
            ItemOrigin::Trigger(TriggerBinding {
                name: "init".into(),
                priority: 5,
            }),
            ItemSpec::new("a.php"),
        );
        assert_eq!(item.kind(), CollectorKind::Trigger);
        assert_eq!(item.trigger().map(|t| t.priority), Some(5));

        let item = CollectedItem::new(ItemOrigin::Direct, ItemSpec::new("a.php"));
        assert!(item.trigger().is_none());
        assert_eq!(item.kind().to_string(), "direct");
    }

    #[test]
    fn test_origin_serializes_tagged() {
        let origin = ItemOrigin::Environment {
            group: "staging".into(),
        };
        let json = serde_json::to_value(&origin).unwrap();
        assert_eq!(json["kind"], "environment");
        assert_eq!(json["group"], "staging");
    }
}
