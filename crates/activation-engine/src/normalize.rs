//! Source normalization
//!
//! Raw item lists arrive in several shapes: bare identifier strings, spec
//! maps keyed by `identifier` or `file`, and wrappers that nest a list under
//! `data`, `items` or `plugins`. The [`Normalizer`] flattens all of them into
//! one ordered list of [`ItemSpec`]s.
//!
//! Identifiers are deduplicated with last-write-wins semantics while keeping
//! the position of the first occurrence.

use activation_types::{defaults, ItemSpec};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Keys that may carry an item identifier, in lookup order
const IDENTIFIER_KEYS: [&str; 2] = ["identifier", "file"];

/// Keys that may carry a nested item list, in lookup order
pub(crate) const LIST_KEYS: [&str; 2] = ["items", "plugins"];

/// Wrapper nesting deeper than this is ignored
const MAX_DEPTH: usize = 8;

/// Flattens heterogeneous item lists into specs
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    default_order: i64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer that gives specs the standard spec order
    pub fn new() -> Self {
        Self::with_default_order(defaults::SPEC_ORDER)
    }

    /// Normalizer that gives specs without an `order` the given one
    pub fn with_default_order(default_order: i64) -> Self {
        Self { default_order }
    }

    /// Flatten and deduplicate a raw list
    pub fn normalize(&self, raw: &[Value]) -> Vec<ItemSpec> {
        let mut specs: IndexMap<String, ItemSpec> = IndexMap::new();
        for element in raw {
            self.visit(element, 0, &mut specs);
        }
        specs.into_values().collect()
    }

    /// Parse a single entry: a bare identifier or a spec map.
    ///
    /// Wrappers are not unfolded here. Returns `None` when the entry has no
    /// usable identifier.
    pub fn parse_entry(&self, value: &Value) -> Option<ItemSpec> {
        match value {
            Value::String(identifier) => {
                let identifier = identifier.trim();
                (!identifier.is_empty())
                    .then(|| ItemSpec::with_default_order(identifier, self.default_order))
            }
            Value::Object(map) => self.parse_spec_map(map),
            _ => None,
        }
    }

    fn visit(&self, element: &Value, depth: usize, specs: &mut IndexMap<String, ItemSpec>) {
        if depth > MAX_DEPTH {
            tracing::debug!(depth, "Item list nested too deeply, skipping");
            return;
        }

        match element {
            Value::String(_) => self.insert(element, specs),
            Value::Object(map) => {
                if let Some(data) = map.get("data") {
                    match data {
                        Value::Array(items) => {
                            for item in items {
                                self.visit(item, depth + 1, specs);
                            }
                        }
                        other => self.visit(other, depth + 1, specs),
                    }
                } else if has_identifier(map) {
                    self.insert(element, specs);
                } else if let Some(items) = nested_list(map) {
                    for item in items {
                        self.visit(item, depth + 1, specs);
                    }
                } else {
                    tracing::debug!("Item map without identifier or nested list, skipping");
                }
            }
            other => {
                tracing::debug!(shape = json_type(other), "Unsupported item entry, skipping");
            }
        }
    }

    fn insert(&self, element: &Value, specs: &mut IndexMap<String, ItemSpec>) {
        match self.parse_entry(element) {
            // IndexMap keeps the first slot on overwrite
            Some(spec) => {
                specs.insert(spec.identifier.clone(), spec);
            }
            None => tracing::debug!("Item entry without usable identifier, skipping"),
        }
    }

    fn parse_spec_map(&self, map: &Map<String, Value>) -> Option<ItemSpec> {
        let identifier = IDENTIFIER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|id| !id.is_empty())?;

        let mut spec = ItemSpec::with_default_order(identifier, self.default_order)
            .required(read_bool(map.get("required")).unwrap_or(defaults::REQUIRED))
            .deferred(read_bool(map.get("defer")).unwrap_or(defaults::DEFER));

        if let Some(order) = read_int(map.get("order")) {
            spec = spec.with_order(order);
        }
        if let Some(version) = read_string(map.get("version")) {
            spec = spec.with_version(version);
        }
        Some(spec)
    }
}

/// Normalize with the standard spec defaults
pub fn normalize(raw: &[Value]) -> Vec<ItemSpec> {
    Normalizer::new().normalize(raw)
}

fn has_identifier(map: &Map<String, Value>) -> bool {
    IDENTIFIER_KEYS.iter().any(|key| map.contains_key(*key))
}

/// First nested item list under one of the list keys
pub(crate) fn nested_list(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    LIST_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(Value::as_array)
}

/// Tolerant boolean: JSON bools, non-zero numbers, and "true"/"1"/"yes"/"on"
pub(crate) fn read_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => Some(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )),
        _ => None,
    }
}

/// Tolerant integer: JSON numbers (fractions truncated) and numeric strings
pub(crate) fn read_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-blank string, accepting numbers in their JSON form
pub(crate) fn read_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON type name, for diagnostics
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(specs: &[ItemSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.identifier.as_str()).collect()
    }

    #[test]
    fn test_bare_strings_get_defaults() {
        let specs = normalize(&[json!("a.php"), json!("b.php")]);
        assert_eq!(ids(&specs), vec!["a.php", "b.php"]);
        assert_eq!(specs[0].order, defaults::SPEC_ORDER);
        assert!(!specs[0].required);
    }

    #[test]
    fn test_last_write_wins_keeps_first_position() {
        let specs = normalize(&[
            json!("a.php"),
            json!("b.php"),
            json!({"identifier": "a.php", "required": true}),
        ]);
        assert_eq!(ids(&specs), vec!["a.php", "b.php"]);
        assert!(specs[0].required);
    }

    #[test]
    fn test_spec_map_fields() {
        let specs = normalize(&[json!({
            "file": "x/x.php",
            "required": "yes",
            "version": ">=2.1",
            "order": "3",
            "defer": 1
        })]);
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.identifier, "x/x.php");
        assert!(spec.required);
        assert_eq!(spec.version.as_deref(), Some(">=2.1"));
        assert_eq!(spec.order, 3);
        assert!(spec.defer);
    }

    #[test]
    fn test_wrappers_are_unfolded() {
        let specs = normalize(&[
            json!({"data": {"identifier": "a.php"}}),
            json!({"data": {"plugins": ["b.php", {"file": "c.php"}]}}),
            json!({"items": ["d.php"]}),
            json!({"data": ["e.php"]}),
        ]);
        assert_eq!(ids(&specs), vec!["a.php", "b.php", "c.php", "d.php", "e.php"]);
    }

    #[test]
    fn test_unusable_entries_are_skipped() {
        let specs = normalize(&[
            json!(42),
            json!(null),
            json!(["nested.php"]),
            json!({"identifier": ""}),
            json!({"name": "no-id"}),
            json!("   "),
            json!("ok.php"),
        ]);
        assert_eq!(ids(&specs), vec!["ok.php"]);
    }

    #[test]
    fn test_identifier_falls_back_to_file_key() {
        let specs = normalize(&[json!({"identifier": " ", "file": "f.php"})]);
        assert_eq!(ids(&specs), vec!["f.php"]);
    }

    #[test]
    fn test_custom_default_order() {
        let normalizer = Normalizer::with_default_order(defaults::COLLECTED_ORDER);
        let specs = normalizer.normalize(&[json!("a.php"), json!({"file": "b.php", "order": 7})]);
        assert_eq!(specs[0].order, 0);
        assert_eq!(specs[1].order, 7);
    }

    #[test]
    fn test_excessive_nesting_is_ignored() {
        let mut value = json!("deep.php");
        for _ in 0..(MAX_DEPTH + 2) {
            value = json!({ "data": value });
        }
        assert!(normalize(&[value]).is_empty());
    }

    #[test]
    fn test_tolerant_readers() {
        assert_eq!(read_bool(Some(&json!("TRUE"))), Some(true));
        assert_eq!(read_bool(Some(&json!("0"))), Some(false));
        assert_eq!(read_bool(Some(&json!([]))), None);
        assert_eq!(read_int(Some(&json!(4.9))), Some(4));
        assert_eq!(read_int(Some(&json!("x"))), None);
        assert_eq!(read_string(Some(&json!(2))), Some("2".to_string()));
        assert_eq!(read_string(Some(&json!(""))), None);
    }
}
