//! Direct collector
//!
//! Emits every item of the configured list whose identifier has the expected
//! shape. The list itself goes through the source normalizer, so all wrapper
//! forms are accepted.

use super::{CollectContext, IdentifierShape};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::normalize::{json_type, Normalizer};
use activation_types::{defaults, CollectedItem, ItemOrigin, ItemSpec};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct DirectCollector {
    items: Vec<ItemSpec>,
    shape: IdentifierShape,
}

impl DirectCollector {
    pub fn new(items: Vec<ItemSpec>, shape: IdentifierShape) -> Self {
        Self { items, shape }
    }

    /// Parse the direct-item section of a configuration document
    pub fn parse_section(value: &Value, diagnostics: &dyn DiagnosticsSink) -> Vec<ItemSpec> {
        match value {
            Value::Array(raw) => {
                Normalizer::with_default_order(defaults::COLLECTED_ORDER).normalize(raw)
            }
            other => {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::MalformedConfig,
                    format!("Direct item list must be an array, got {}", json_type(other)),
                ));
                Vec::new()
            }
        }
    }

    pub fn items(&self) -> &[ItemSpec] {
        &self.items
    }

    pub fn collect(&self, ctx: &CollectContext<'_>) -> Vec<CollectedItem> {
        let mut collected = Vec::with_capacity(self.items.len());
        for spec in &self.items {
            if !self.shape.accepts(&spec.identifier) {
                ctx.diagnostics.record(
                    Diagnostic::warning(
                        DiagnosticCode::InvalidEntry,
                        format!(
                            "Direct item '{}' dropped: identifier must end with '{}'",
                            spec.identifier,
                            self.shape.suffix()
                        ),
                    )
                    .for_item(&spec.identifier),
                );
                continue;
            }
            collected.push(CollectedItem::new(ItemOrigin::Direct, spec.clone()));
        }
        collected
    }
}
