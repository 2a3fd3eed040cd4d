//! Registry trait
//!
//! Queries are infallible: a registry that cannot answer reports the item as
//! absent or inactive. Only the side-effecting calls can fail.

use crate::error::Result;
use std::collections::BTreeSet;

/// View of the external item registry
pub trait RegistryView: Send + Sync {
    /// Check if an item is installed
    fn exists(&self, identifier: &str) -> bool;

    /// Installed version of an item, if the registry knows it
    fn current_version(&self, identifier: &str) -> Option<String>;

    /// Check if an item is currently active
    fn is_active(&self, identifier: &str) -> bool;

    /// Activate one item
    fn activate(&self, identifier: &str) -> Result<()>;

    /// Deactivate a set of items in one call
    fn deactivate(&self, identifiers: &BTreeSet<String>) -> Result<()>;

    /// Identifiers of every active item
    fn list_active(&self) -> BTreeSet<String>;
}
