//! Environment collector
//!
//! Groups are tried in configuration order and the first one whose match
//! value equals the current environment identity wins. Matching is exact
//! (after stripping trailing slashes on both sides) and constant-time.

use super::{parse_item_entries, CollectContext, IdentifierShape, ItemEntry};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::normalize::{json_type, read_int, read_string};
use activation_types::{defaults, CollectedItem, ItemOrigin};
use serde_json::Value;
use subtle::ConstantTimeEq;

/// Keys that may carry a group's match value, in lookup order
const MATCH_KEYS: [&str; 2] = ["url", "match"];

/// Items enabled for one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentGroup {
    /// Group name, for diagnostics
    pub name: String,
    /// Identity this group applies to
    pub match_value: String,
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentCollector {
    groups: Vec<EnvironmentGroup>,
    shape: IdentifierShape,
}

impl EnvironmentCollector {
    pub fn new(groups: Vec<EnvironmentGroup>, shape: IdentifierShape) -> Self {
        Self { groups, shape }
    }

    /// Parse the environment-group section of a configuration document
    pub fn parse_section(
        value: &Value,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Vec<EnvironmentGroup> {
        let Value::Object(groups) = value else {
            diagnostics.record(Diagnostic::warning(
                DiagnosticCode::MalformedConfig,
                format!("Environment groups must be an object, got {}", json_type(value)),
            ));
            return Vec::new();
        };

        let mut parsed = Vec::with_capacity(groups.len());
        for (name, group) in groups {
            let Value::Object(group) = group else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!(
                        "Environment group '{name}' dropped: expected object, got {}",
                        json_type(group)
                    ),
                ));
                continue;
            };

            let Some(match_value) = MATCH_KEYS
                .iter()
                .find_map(|key| read_string(group.get(*key)))
            else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Environment group '{name}' dropped: no url to match"),
                ));
                continue;
            };

            let order = read_int(group.get("order")).unwrap_or(defaults::COLLECTED_ORDER);
            parsed.push(EnvironmentGroup {
                name: name.clone(),
                match_value,
                items: parse_item_entries(group, order),
            });
        }
        parsed
    }

    pub fn groups(&self) -> &[EnvironmentGroup] {
        &self.groups
    }

    /// First group matching `identity`, if any
    pub fn matching_group(&self, identity: &str) -> Option<&EnvironmentGroup> {
        let identity = normalize_identity(identity);
        if identity.is_empty() {
            return None;
        }
        self.groups
            .iter()
            .find(|group| identities_equal(normalize_identity(&group.match_value), identity))
    }

    pub fn collect(&self, ctx: &CollectContext<'_>) -> Vec<CollectedItem> {
        let identity = ctx.environment.current();
        let Some(group) = self.matching_group(&identity) else {
            tracing::debug!(identity = %identity, "No environment group matches");
            return Vec::new();
        };

        tracing::debug!(group = %group.name, "Environment group matched");
        let origin = ItemOrigin::Environment {
            group: group.name.clone(),
        };

        let mut collected = Vec::with_capacity(group.items.len());
        for entry in &group.items {
            match entry {
                ItemEntry::Spec(spec) if self.shape.accepts(&spec.identifier) => {
                    collected.push(CollectedItem::new(origin.clone(), spec.clone()));
                }
                ItemEntry::Spec(spec) => ctx.diagnostics.record(
                    Diagnostic::warning(
                        DiagnosticCode::InvalidEntry,
                        format!(
                            "Environment group '{}': item '{}' dropped, identifier must end with '{}'",
                            group.name,
                            spec.identifier,
                            self.shape.suffix()
                        ),
                    )
                    .for_item(&spec.identifier),
                ),
                ItemEntry::Unusable { shape } => ctx.diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!(
                        "Environment group '{}': item entry without identifier dropped (got {shape})",
                        group.name
                    ),
                )),
            }
        }
        collected
    }
}

/// Trim whitespace and trailing slashes
pub fn normalize_identity(identity: &str) -> &str {
    identity.trim().trim_end_matches('/')
}

fn identities_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::test_support::Harness;
    use crate::diagnostics::MemorySink;
    use crate::lookup::StaticEnvironment;
    use serde_json::json;

    fn collector(doc: Value) -> EnvironmentCollector {
        let sink = MemorySink::new();
        EnvironmentCollector::new(
            EnvironmentCollector::parse_section(&doc, &sink),
            IdentifierShape::default(),
        )
    }

    #[test]
    fn test_first_exact_match_wins() {
        let collector = collector(json!({
            "staging": {"url": "https://staging.example.test/", "items": ["s.php"]},
            "prod": {"url": "https://example.test", "items": ["p.php", "q.php"]},
            "prod-again": {"url": "https://example.test/", "items": ["never.php"]}
        }));

        let harness = Harness::new();
        let collected = collector.collect(&harness.ctx());
        let ids: Vec<_> = collected.iter().map(|c| c.identifier()).collect();
        assert_eq!(ids, vec!["p.php", "q.php"]);
        assert_eq!(
            collected[0].origin,
            ItemOrigin::Environment {
                group: "prod".into()
            }
        );
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        let collector = collector(json!({
            "root": {"url": "https://example.test/blog", "items": ["a.php"]}
        }));
        assert!(collector.matching_group("https://example.test").is_none());
        assert!(collector.matching_group("https://example.test/blog/").is_some());
    }

    #[test]
    fn test_no_match_is_empty() {
        let collector = collector(json!({
            "other": {"url": "https://other.test", "items": ["a.php"]}
        }));
        let harness = Harness::new();
        assert!(collector.collect(&harness.ctx()).is_empty());
        assert!(harness.sink.is_empty());
    }

    #[test]
    fn test_empty_identity_never_matches() {
        let collector = collector(json!({
            "blank": {"url": "/", "items": ["a.php"]}
        }));
        let mut harness = Harness::new();
        harness.environment = StaticEnvironment::new("");
        assert!(collector.collect(&harness.ctx()).is_empty());
    }

    #[test]
    fn test_invalid_items_are_reported_with_group() {
        let collector = collector(json!({
            "prod": {"url": "https://example.test", "order": 3, "plugins": ["ok.php", "bad.js", 5]}
        }));
        let harness = Harness::new();
        let collected = collector.collect(&harness.ctx());
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].order(), 3);

        let dropped = harness.sink.with_code(DiagnosticCode::InvalidEntry);
        assert_eq!(dropped.len(), 2);
        assert!(dropped.iter().all(|d| d.message.contains("'prod'")));
    }

    #[test]
    fn test_malformed_groups_are_dropped() {
        let sink = MemorySink::new();
        let groups = EnvironmentCollector::parse_section(
            &json!({"a": "nope", "b": {"items": ["x.php"]}, "c": {"match": "https://c.test"}}),
            &sink,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "c");
        assert_eq!(sink.with_code(DiagnosticCode::InvalidEntry).len(), 2);

        let groups = EnvironmentCollector::parse_section(&json!(["x"]), &sink);
        assert!(groups.is_empty());
        assert_eq!(sink.with_code(DiagnosticCode::MalformedConfig).len(), 1);
    }
}
