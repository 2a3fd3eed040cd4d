//! Predicate collector
//!
//! Each rule tests one host field with one operator. Rules are evaluated
//! against the current field value on every collect; nothing is cached.
//!
//! Operator semantics:
//!
//! | operator     | true when                                                  |
//! |--------------|------------------------------------------------------------|
//! | `equals`     | field is present and its loose string equals the expected  |
//! | `not_equals` | loose strings differ (an absent field reads as `""`)       |
//! | `contains`   | both sides are strings and the field contains the expected |
//! | `in`         | expected is a list holding a strictly equal value          |
//!
//! `not_equals` does not special-case an absent field the way `equals` does.
//! That asymmetry is existing behavior and is kept as-is.

use super::{collect_entries, parse_item_entries, CollectContext, ItemEntry};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::normalize::{json_type, read_int, read_string};
use activation_types::{defaults, CollectedItem, FieldValue, ItemOrigin, PredicateOperator};
use serde_json::Value;

/// Keys that may carry the tested field name, in lookup order
const FIELD_KEYS: [&str; 2] = ["field", "option"];

/// Configured operator of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOperator {
    Known(PredicateOperator),
    /// Name outside the fixed set; evaluated as the default operator
    Unknown(String),
}

impl Default for RuleOperator {
    fn default() -> Self {
        Self::Known(defaults::PREDICATE_OPERATOR)
    }
}

/// Items gated on one field condition
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateRule {
    pub field: String,
    pub operator: RuleOperator,
    pub expected: FieldValue,
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct PredicateCollector {
    rules: Vec<PredicateRule>,
}

impl PredicateCollector {
    pub fn new(rules: Vec<PredicateRule>) -> Self {
        Self { rules }
    }

    /// Parse the predicate-rule section of a configuration document
    pub fn parse_section(value: &Value, diagnostics: &dyn DiagnosticsSink) -> Vec<PredicateRule> {
        let Value::Array(rules) = value else {
            diagnostics.record(Diagnostic::warning(
                DiagnosticCode::MalformedConfig,
                format!("Predicate rules must be an array, got {}", json_type(value)),
            ));
            return Vec::new();
        };

        let mut parsed = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            let Value::Object(rule) = rule else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!(
                        "Predicate rule #{index} dropped: expected object, got {}",
                        json_type(rule)
                    ),
                ));
                continue;
            };

            let Some(field) = FIELD_KEYS.iter().find_map(|key| read_string(rule.get(*key)))
            else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Predicate rule #{index} dropped: missing field"),
                ));
                continue;
            };

            // A null value is legal, a missing one is not
            let Some(expected) = rule.get("value") else {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Predicate rule on field '{field}' dropped: missing value"),
                ));
                continue;
            };

            let order = read_int(rule.get("order")).unwrap_or(defaults::COLLECTED_ORDER);
            let items = parse_item_entries(rule, order);
            if items.is_empty() {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::InvalidEntry,
                    format!("Predicate rule on field '{field}' dropped: no items"),
                ));
                continue;
            }

            let operator = match rule.get("operator") {
                None | Some(Value::Null) => RuleOperator::default(),
                Some(Value::String(name)) => match name.parse() {
                    Ok(op) => RuleOperator::Known(op),
                    Err(_) => RuleOperator::Unknown(name.clone()),
                },
                Some(other) => RuleOperator::Unknown(other.to_string()),
            };

            parsed.push(PredicateRule {
                field,
                operator,
                expected: FieldValue::from(expected),
                items,
            });
        }
        parsed
    }

    pub fn rules(&self) -> &[PredicateRule] {
        &self.rules
    }

    pub fn collect(&self, ctx: &CollectContext<'_>) -> Vec<CollectedItem> {
        let mut collected = Vec::new();
        for rule in &self.rules {
            let operator = match &rule.operator {
                RuleOperator::Known(op) => *op,
                RuleOperator::Unknown(name) => {
                    ctx.diagnostics.record(Diagnostic::warning(
                        DiagnosticCode::UnknownOperator,
                        format!(
                            "Predicate on field '{}': unknown operator '{name}', using '{}'",
                            rule.field,
                            defaults::PREDICATE_OPERATOR
                        ),
                    ));
                    defaults::PREDICATE_OPERATOR
                }
            };

            let actual = ctx.fields.get(&rule.field);
            let matched = evaluate(operator, &actual, &rule.expected);
            tracing::debug!(
                field = %rule.field,
                operator = %operator,
                actual = actual.type_name(),
                matched,
                "Predicate evaluated"
            );
            if !matched {
                continue;
            }

            let origin = ItemOrigin::Predicate {
                field: rule.field.clone(),
            };
            let label = format!("Predicate rule on field '{}'", rule.field);
            collected.extend(collect_entries(&rule.items, &origin, &label, ctx.diagnostics));
        }
        collected
    }
}

/// Evaluate one condition
pub fn evaluate(operator: PredicateOperator, actual: &FieldValue, expected: &FieldValue) -> bool {
    match operator {
        PredicateOperator::Equals => {
            !actual.is_absent() && actual.to_loose_string() == expected.to_loose_string()
        }
        PredicateOperator::NotEquals => actual.to_loose_string() != expected.to_loose_string(),
        PredicateOperator::Contains => match (actual.as_str(), expected.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        PredicateOperator::In => expected
            .as_list()
            .map(|candidates| candidates.contains(actual))
            .unwrap_or(false),
    }
}
