//! Reconciliation decision types
//!
//! Decisions record what reconciliation did with each plan entry. They are
//! produced fresh on every run and never persisted.

use serde::{Deserialize, Serialize};

/// Which activation pass an entry belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPass {
    #[default]
    Immediate,
    Deferred,
}

impl ActivationPass {
    pub fn for_defer(defer: bool) -> Self {
        if defer {
            Self::Deferred
        } else {
            Self::Immediate
        }
    }
}

/// Side effect chosen for a plan entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Activation was issued
    Activate,
    /// Deactivation was issued
    Deactivate,
    /// Registry already in the desired state
    Skip,
}

/// Why an entry was bucketed the way it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Ok,
    MissingFile,
    VersionMismatch,
    /// Repeated identifier already activated earlier in the same run
    DuplicateNoop,
}

impl DecisionReason {
    /// True when the entry belongs in the activation bucket
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok | Self::DuplicateNoop)
    }
}

/// Outcome for one plan entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationDecision {
    pub identifier: String,
    pub action: DecisionAction,
    pub reason: DecisionReason,
    pub pass: ActivationPass,
}

impl ReconciliationDecision {
    pub fn new(
        identifier: impl Into<String>,
        action: DecisionAction,
        reason: DecisionReason,
        pass: ActivationPass,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            action,
            reason,
            pass,
        }
    }

    /// Whether a registry side effect was issued for this entry
    pub fn changed_registry(&self) -> bool {
        !matches!(self.action, DecisionAction::Skip)
    }
}

/// Installed version that does not satisfy a plan entry's constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIssue {
    pub identifier: String,
    pub constraint: String,
    /// Version reported by the registry, if any
    pub installed: Option<String>,
    pub required: bool,
}
