//! Trigger collector
//!
//! Associates items with an external event name and priority. Collection is
//! unconditional: the planner only records the intent, gating happens in the
//! host's event system when the event fires.

use super::{collect_entries, parse_item_entries, CollectContext, ItemEntry};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::normalize::{json_type, read_int, read_string};
use activation_types::{defaults, CollectedItem, ItemOrigin, TriggerBinding};
use serde_json::Value;

/// Keys that may carry the event name, in lookup order
const NAME_KEYS: [&str; 2] = ["hook", "trigger"];

/// Items bound to one external event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRule {
    pub name: String,
    pub priority: i64,
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct TriggerCollector {
    rules: Vec<TriggerRule>,
}

impl TriggerCollector {
    pub fn new(rules: Vec<TriggerRule>) -> Self {
        Self { rules }
    }

    /// Parse the trigger-rule section of a configuration document
    pub fn parse_section(value: &Value, diagnostics: &dyn DiagnosticsSink) -> Vec<TriggerRule> {
        let Value::Array(rules) = value else {
            diagnostics.record(Diagnostic::warning(
                DiagnosticCode::MalformedConfig,
                format!("Trigger rules must be an array, got {}", json_type(value)),
            ));
            return Vec::new();
        };

        let mut parsed = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            let Value::Object(rule) = rule else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!(
                        "Trigger rule #{index} dropped: expected object, got {}",
                        json_type(rule)
                    ),
                ));
                continue;
            };

            let Some(name) = NAME_KEYS.iter().find_map(|key| read_string(rule.get(*key))) else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Trigger rule #{index} dropped: missing trigger name"),
                ));
                continue;
            };

            let order = read_int(rule.get("order")).unwrap_or(defaults::COLLECTED_ORDER);
            let items = parse_item_entries(rule, order);
            if items.is_empty() {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Trigger rule '{name}' dropped: no items"),
                ));
                continue;
            }

            parsed.push(TriggerRule {
                name,
                priority: read_int(rule.get("priority")).unwrap_or(defaults::TRIGGER_PRIORITY),
                items,
            });
        }
        parsed
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    pub fn collect(&self, ctx: &CollectContext<'_>) -> Vec<CollectedItem> {
        let mut collected = Vec::new();
        for rule in &self.rules {
            let origin = ItemOrigin::Trigger(TriggerBinding {
                name: rule.name.clone(),
                priority: rule.priority,
            });
            let label = format!("Trigger rule '{}'", rule.name);
            collected.extend(collect_entries(&rule.items, &origin, &label, ctx.diagnostics));
        }
        collected
    }
}
