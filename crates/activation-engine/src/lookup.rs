//! Host lookups consulted while collecting
//!
//! [`EnvironmentIdentity`] names the environment the planner runs in (for a
//! site host, its canonical URL). [`FieldLookup`] reads the settings that
//! predicate rules test.

use activation_types::FieldValue;
use dashmap::DashMap;

/// Identity of the current environment
pub trait EnvironmentIdentity: Send + Sync {
    fn current(&self) -> String;
}

/// Settings store consulted by predicate rules
pub trait FieldLookup: Send + Sync {
    /// Value of `field`, or [`FieldValue::Absent`] when it has none
    fn get(&self, field: &str) -> FieldValue;
}

/// Fixed environment identity
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    identity: String,
}

impl StaticEnvironment {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

impl EnvironmentIdentity for StaticEnvironment {
    fn current(&self) -> String {
        self.identity.clone()
    }
}

/// In-memory settings table
#[derive(Debug, Default)]
pub struct MapFieldLookup {
    fields: DashMap<String, FieldValue>,
}

impl MapFieldLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&self, field: &str) {
        self.fields.remove(field);
    }
}

impl FieldLookup for MapFieldLookup {
    fn get(&self, field: &str) -> FieldValue {
        self.fields
            .get(field)
            .map(|value| value.value().clone())
            .unwrap_or(FieldValue::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup_reports_absent() {
        let fields = MapFieldLookup::new().with_field("mode", "live");
        assert_eq!(fields.get("mode"), FieldValue::Str("live".into()));
        assert_eq!(fields.get("missing"), FieldValue::Absent);

        fields.remove("mode");
        assert!(fields.get("mode").is_absent());
    }

    #[test]
    fn test_static_environment() {
        let env = StaticEnvironment::new("https://example.test");
        assert_eq!(env.current(), "https://example.test");
    }
}
