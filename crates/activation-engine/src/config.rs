//! Activation configuration
//!
//! Converts the decoded JSON document handed over by a [`ConfigSource`] into
//! a strongly typed [`ActivationConfig`]. This is the only place a
//! `serde_json::Value` is inspected; anything that does not fit is skipped at
//! the smallest possible scope and reported through the diagnostics sink.
//!
//! ```json
//! {
//!   "plugins": ["seo/seo.php", {"file": "cache/cache.php", "order": 1}],
//!   "environments": {
//!     "production": {"url": "https://example.test", "items": ["cdn/cdn.php"]}
//!   },
//!   "hooks": [{"hook": "admin_init", "priority": 20, "items": ["admin.php"]}],
//!   "conditions": [{"field": "mode", "operator": "equals", "value": "live", "items": ["live.php"]}]
//! }
//! ```
//!
//! [`ConfigSource`]: crate::source::ConfigSource

use crate::collectors::{
    DirectCollector, EnvironmentCollector, EnvironmentGroup, PredicateCollector, PredicateRule,
    TriggerCollector, TriggerRule,
};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink};
use crate::normalize::json_type;
use activation_types::ItemSpec;
use serde_json::{Map, Value};

/// Section keys, each with its alias
const DIRECT_KEYS: [&str; 2] = ["plugins", "items"];
const ENVIRONMENT_KEYS: [&str; 2] = ["environments", "urls"];
const TRIGGER_KEYS: [&str; 2] = ["hooks", "triggers"];
const PREDICATE_KEYS: [&str; 2] = ["conditions", "predicates"];

/// Typed activation configuration for one tenant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationConfig {
    pub direct: Vec<ItemSpec>,
    pub environments: Vec<EnvironmentGroup>,
    pub triggers: Vec<TriggerRule>,
    pub predicates: Vec<PredicateRule>,
}

impl ActivationConfig {
    /// Parse a decoded configuration document
    pub fn from_value(document: &Value, diagnostics: &dyn DiagnosticsSink) -> Self {
        let root = match document {
            Value::Object(root) => root,
            Value::Null => return Self::default(),
            other => {
                diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::MalformedConfig,
                    format!(
                        "Activation configuration must be an object, got {}; treating as empty",
                        json_type(other)
                    ),
                ));
                return Self::default();
            }
        };

        let config = Self {
            direct: section(root, &DIRECT_KEYS)
                .map(|v| DirectCollector::parse_section(v, diagnostics))
                .unwrap_or_default(),
            environments: section(root, &ENVIRONMENT_KEYS)
                .map(|v| EnvironmentCollector::parse_section(v, diagnostics))
                .unwrap_or_default(),
            triggers: section(root, &TRIGGER_KEYS)
                .map(|v| TriggerCollector::parse_section(v, diagnostics))
                .unwrap_or_default(),
            predicates: section(root, &PREDICATE_KEYS)
                .map(|v| PredicateCollector::parse_section(v, diagnostics))
                .unwrap_or_default(),
        };

        tracing::debug!(
            direct = config.direct.len(),
            environments = config.environments.len(),
            triggers = config.triggers.len(),
            predicates = config.predicates.len(),
            "Parsed activation configuration"
        );
        config
    }

    /// True when no section holds anything
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
            && self.environments.is_empty()
            && self.triggers.is_empty()
            && self.predicates.is_empty()
    }
}

/// First non-null value under one of `keys`
fn section<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| root.get(*key))
        .find(|value| !value.is_null())
}
