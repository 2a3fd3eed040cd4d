//! Item specifications
//!
//! An ItemSpec is the unit of work: one item a rule source wants active,
//! plus the conditions it must meet in the registry.

use crate::defaults;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Specification for a single item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Registry key of the item (for plugins, the plugin file path)
    pub identifier: String,

    /// Failure to satisfy this item is reported with elevated severity
    #[serde(default)]
    pub required: bool,

    /// Version constraint expression, e.g. `>=1.2.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Position in the merged plan (lower sorts first)
    #[serde(default = "default_spec_order")]
    pub order: i64,

    /// Activate in the deferred pass instead of the immediate one
    #[serde(default)]
    pub defer: bool,
}

fn default_spec_order() -> i64 {
    defaults::SPEC_ORDER
}

impl ItemSpec {
    /// Create a spec with the normalizer defaults
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_default_order(identifier, defaults::SPEC_ORDER)
    }

    /// Create a spec with every default except the order
    pub fn with_default_order(identifier: impl Into<String>, order: i64) -> Self {
        Self {
            identifier: identifier.into(),
            required: defaults::REQUIRED,
            version: None,
            order,
            defer: defaults::DEFER,
        }
    }

    /// Mark the item as required
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach a version constraint
    pub fn with_version(mut self, constraint: impl Into<String>) -> Self {
        self.version = Some(constraint.into());
        self
    }

    /// Set the plan order
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Move the item to the deferred pass
    pub fn deferred(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    /// Version constraint, treating an empty string as absent
    pub fn version_constraint(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Validate the spec
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        if self.identifier.trim().is_empty() {
            return Err(SpecValidationError::EmptyIdentifier);
        }
        Ok(())
    }
}

/// Spec validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecValidationError {
    #[error("Item identifier is empty")]
    EmptyIdentifier,
}
