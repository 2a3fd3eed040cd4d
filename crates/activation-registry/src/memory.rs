//! In-memory implementation of the registry trait
//!
//! Suitable for development and testing. Every side-effecting call is
//! appended to an operation log so callers can assert on exactly what the
//! planner asked the registry to do.

use crate::error::{RegistryError, Result};
use crate::view::RegistryView;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Installed item state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ItemRecord {
    version: Option<String>,
    active: bool,
}

/// A side-effecting call received by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryOperation {
    Activate(String),
    Deactivate(BTreeSet<String>),
}

/// In-memory item registry
pub struct InMemoryRegistry {
    items: DashMap<String, ItemRecord>,
    refused: DashMap<String, String>,
    operations: Mutex<Vec<RegistryOperation>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            refused: DashMap::new(),
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Install an inactive item
    pub fn install(&self, identifier: impl Into<String>, version: Option<&str>) {
        self.items.insert(
            identifier.into(),
            ItemRecord {
                version: version.map(str::to_string),
                active: false,
            },
        );
    }

    /// Install an item that is already active
    pub fn install_active(&self, identifier: impl Into<String>, version: Option<&str>) {
        self.items.insert(
            identifier.into(),
            ItemRecord {
                version: version.map(str::to_string),
                active: true,
            },
        );
    }

    /// Builder form of [`install`](Self::install)
    pub fn with_item(self, identifier: impl Into<String>, version: Option<&str>) -> Self {
        self.install(identifier, version);
        self
    }

    /// Builder form of [`install_active`](Self::install_active)
    pub fn with_active_item(self, identifier: impl Into<String>, version: Option<&str>) -> Self {
        self.install_active(identifier, version);
        self
    }

    /// Remove an item entirely
    pub fn uninstall(&self, identifier: &str) {
        self.items.remove(identifier);
    }

    /// Make every future activation of `identifier` fail
    pub fn refuse_activation(&self, identifier: impl Into<String>, reason: impl Into<String>) {
        self.refused.insert(identifier.into(), reason.into());
    }

    /// Every side-effecting call received so far, oldest first
    pub fn operations(&self) -> Vec<RegistryOperation> {
        self.operations.lock().clone()
    }

    /// Forget the operation log
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, operation: RegistryOperation) {
        self.operations.lock().push(operation);
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryView for InMemoryRegistry {
    fn exists(&self, identifier: &str) -> bool {
        self.items.contains_key(identifier)
    }

    fn current_version(&self, identifier: &str) -> Option<String> {
        self.items
            .get(identifier)
            .and_then(|record| record.version.clone())
    }

    fn is_active(&self, identifier: &str) -> bool {
        self.items
            .get(identifier)
            .map(|record| record.active)
            .unwrap_or(false)
    }

    fn activate(&self, identifier: &str) -> Result<()> {
        self.record(RegistryOperation::Activate(identifier.to_string()));

        if let Some(reason) = self.refused.get(identifier) {
            return Err(RegistryError::ActivationRefused {
                identifier: identifier.to_string(),
                reason: reason.value().clone(),
            });
        }

        match self.items.get_mut(identifier) {
            Some(mut record) => {
                record.active = true;
                tracing::debug!(identifier, "Item activated");
                Ok(())
            }
            None => Err(RegistryError::ItemNotFound(identifier.to_string())),
        }
    }

    fn deactivate(&self, identifiers: &BTreeSet<String>) -> Result<()> {
        if identifiers.is_empty() {
            return Ok(());
        }
        self.record(RegistryOperation::Deactivate(identifiers.clone()));

        // Unknown identifiers are ignored, like a host plugin manager would
        for identifier in identifiers {
            if let Some(mut record) = self.items.get_mut(identifier) {
                record.active = false;
            }
        }
        tracing::debug!(count = identifiers.len(), "Items deactivated");
        Ok(())
    }

    fn list_active(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter(|entry| entry.value().active)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_install_and_query() {
        let registry = InMemoryRegistry::new()
            .with_item("a.php", Some("1.2.0"))
            .with_active_item("b.php", None);

        assert!(registry.exists("a.php"));
        assert!(!registry.exists("c.php"));
        assert_eq!(registry.current_version("a.php").as_deref(), Some("1.2.0"));
        assert_eq!(registry.current_version("b.php"), None);
        assert!(!registry.is_active("a.php"));
        assert!(registry.is_active("b.php"));
        assert_eq!(registry.list_active(), set(&["b.php"]));
    }

    #[test]
    fn test_activate_missing_item_fails() {
        let registry = InMemoryRegistry::new();
        let result = registry.activate("ghost.php");
        assert!(matches!(result, Err(RegistryError::ItemNotFound(_))));
        assert_eq!(
            registry.operations(),
            vec![RegistryOperation::Activate("ghost.php".into())]
        );
    }

    #[test]
    fn test_refused_activation() {
        let registry = InMemoryRegistry::new().with_item("a.php", None);
        registry.refuse_activation("a.php", "fatal error on load");

        let result = registry.activate("a.php");
        assert!(matches!(
            result,
            Err(RegistryError::ActivationRefused { .. })
        ));
        assert!(!registry.is_active("a.php"));
    }

    #[test]
    fn test_deactivate_batch() {
        let registry = InMemoryRegistry::new()
            .with_active_item("a.php", None)
            .with_active_item("b.php", None);

        registry.deactivate(&set(&["a.php", "ghost.php"])).unwrap();
        assert_eq!(registry.list_active(), set(&["b.php"]));

        registry.deactivate(&BTreeSet::new()).unwrap();
        assert_eq!(registry.operations().len(), 1);

        registry.clear_operations();
        assert!(registry.operations().is_empty());
    }
}
