//! Reconciliation engine
//!
//! Compares an ordered plan against the registry and issues the activate and
//! deactivate calls that bring the registry in line. Per plan entry, the
//! first failing check wins:
//!
//! 1. empty identifier: the entry is ignored
//! 2. not installed: deactivation bucket (missing)
//! 3. installed version fails the constraint: deactivation bucket (mismatch)
//! 4. otherwise: activation bucket
//!
//! Side effects are idempotent. Already-active items are not re-activated and
//! inactive items are not deactivated. No failure stops the run; registry
//! errors become diagnostics.
//!
//! A [`Reconciler`] lives for one run. It remembers what it activated so a
//! repeated identifier is a no-op, and in [`ApplyMode::DryRun`] it tracks the
//! would-be registry state locally instead of calling the registry.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink, Severity};
use crate::plan::Plan;
use crate::version::satisfies;
use activation_registry::RegistryView;
use activation_types::{
    ActivationPass, CollectedItem, DecisionAction, DecisionReason, ReconciliationDecision,
    VersionIssue,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Whether registry side effects are issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    #[default]
    Commit,
    /// Compute buckets and decisions only
    DryRun,
}

impl ApplyMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else {
            Self::Commit
        }
    }
}

/// Result of reconciling one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub pass: ActivationPass,
    /// Entries that belong active, in plan order
    pub to_activate: Vec<String>,
    /// Entries that belong inactive, in plan order
    pub to_deactivate: Vec<String>,
    pub decisions: Vec<ReconciliationDecision>,
}

impl ReconciliationOutcome {
    /// Empty outcome for `pass`
    pub fn new(pass: ActivationPass) -> Self {
        Self {
            pass,
            ..Default::default()
        }
    }

    /// Decisions that issued a registry call
    pub fn changes(&self) -> impl Iterator<Item = &ReconciliationDecision> {
        self.decisions.iter().filter(|d| d.changed_registry())
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Run-scoped reconciler
pub struct Reconciler<'a> {
    registry: &'a dyn RegistryView,
    diagnostics: &'a dyn DiagnosticsSink,
    mode: ApplyMode,
    /// Activity state changed during this run
    overlay: HashMap<String, bool>,
    /// Identifiers this run issued an activation for
    activated: HashSet<String>,
}

impl<'a> Reconciler<'a> {
    pub fn new(registry: &'a dyn RegistryView, diagnostics: &'a dyn DiagnosticsSink) -> Self {
        Self {
            registry,
            diagnostics,
            mode: ApplyMode::Commit,
            overlay: HashMap::new(),
            activated: HashSet::new(),
        }
    }

    pub fn with_mode(mut self, mode: ApplyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Deactivate every active item that appears nowhere in the plan.
    ///
    /// Returns the pruned identifiers, sorted.
    pub fn prune_unlisted(&mut self, plan: &Plan) -> Vec<String> {
        let listed = plan.identifiers();
        let unlisted: BTreeSet<String> = self
            .registry
            .list_active()
            .into_iter()
            .filter(|id| !listed.contains(id) && self.is_active(id))
            .collect();

        if unlisted.is_empty() {
            return Vec::new();
        }

        let names: Vec<&str> = unlisted.iter().map(String::as_str).collect();
        self.diagnostics.record(Diagnostic::info(
            DiagnosticCode::Pruned,
            format!("Deactivating unlisted items: {}", names.join(", ")),
        ));

        if self.apply_deactivation(&unlisted) {
            for id in &unlisted {
                self.overlay.insert(id.clone(), false);
            }
        }
        unlisted.into_iter().collect()
    }

    /// Report installed items whose version fails their constraint.
    ///
    /// Diagnostics only; the registry is not touched. Missing items are left
    /// to [`Reconciler::reconcile`].
    pub fn check_versions(&self, plan: &Plan) -> Vec<VersionIssue> {
        let mut issues = Vec::new();
        for item in plan {
            let identifier = item.identifier();
            let Some(constraint) = item.spec.version_constraint() else {
                continue;
            };
            if identifier.is_empty() || !self.registry.exists(identifier) {
                continue;
            }

            let installed = self.registry.current_version(identifier);
            if satisfies(installed.as_deref().unwrap_or(""), Some(constraint)) {
                continue;
            }

            let severity = if item.spec.required {
                Severity::Error
            } else {
                Severity::Warning
            };
            self.diagnostics.record(
                Diagnostic::new(
                    severity,
                    DiagnosticCode::VersionMismatch,
                    format!(
                        "Item '{identifier}' requires version {constraint}, installed {}",
                        installed.as_deref().unwrap_or("unknown")
                    ),
                )
                .for_item(identifier),
            );
            issues.push(VersionIssue {
                identifier: identifier.to_string(),
                constraint: constraint.to_string(),
                installed,
                required: item.spec.required,
            });
        }
        issues
    }

    /// Bucket every entry and issue the matching registry calls, in plan order
    pub fn reconcile(&mut self, items: &[CollectedItem], pass: ActivationPass) -> ReconciliationOutcome {
        let mut outcome = ReconciliationOutcome::new(pass);

        for item in items {
            let identifier = item.identifier();
            if identifier.trim().is_empty() {
                continue;
            }

            let reason = self.validate(item);
            let action = if reason.is_ok() {
                outcome.to_activate.push(identifier.to_string());
                self.activate(identifier)
            } else {
                outcome.to_deactivate.push(identifier.to_string());
                self.deactivate(identifier)
            };

            let reason = if reason == DecisionReason::Ok
                && action == DecisionAction::Skip
                && self.activated.contains(identifier)
            {
                DecisionReason::DuplicateNoop
            } else {
                reason
            };
            if action == DecisionAction::Activate {
                self.activated.insert(identifier.to_string());
            }

            tracing::debug!(
                identifier,
                pass = ?pass,
                action = ?action,
                reason = ?reason,
                "Plan entry reconciled"
            );
            outcome
                .decisions
                .push(ReconciliationDecision::new(identifier, action, reason, pass));
        }

        tracing::info!(
            pass = ?pass,
            activate = outcome.to_activate.len(),
            deactivate = outcome.to_deactivate.len(),
            changed = outcome.changes().count(),
            "Reconciliation pass complete"
        );
        outcome
    }

    /// Steps 2 and 3 of the precedence list, with their diagnostics
    fn validate(&self, item: &CollectedItem) -> DecisionReason {
        let identifier = item.identifier();

        if !self.registry.exists(identifier) {
            let diagnostic = if item.spec.required {
                Diagnostic::error(
                    DiagnosticCode::RequiredMissing,
                    format!("Required item '{identifier}' is not installed"),
                )
            } else {
                Diagnostic::warning(
                    DiagnosticCode::OptionalMissing,
                    format!("Item '{identifier}' is not installed"),
                )
            };
            self.diagnostics.record(diagnostic.for_item(identifier));
            return DecisionReason::MissingFile;
        }

        if let Some(constraint) = item.spec.version_constraint() {
            let installed = self.registry.current_version(identifier).unwrap_or_default();
            if !satisfies(&installed, Some(constraint)) {
                self.diagnostics.record(
                    Diagnostic::warning(
                        DiagnosticCode::VersionMismatch,
                        format!("Item '{identifier}' kept inactive: version {constraint} not satisfied"),
                    )
                    .for_item(identifier),
                );
                return DecisionReason::VersionMismatch;
            }
        }

        DecisionReason::Ok
    }

    fn is_active(&self, identifier: &str) -> bool {
        self.overlay
            .get(identifier)
            .copied()
            .unwrap_or_else(|| self.registry.is_active(identifier))
    }

    fn activate(&mut self, identifier: &str) -> DecisionAction {
        if self.is_active(identifier) {
            return DecisionAction::Skip;
        }

        if self.mode == ApplyMode::Commit {
            if let Err(e) = self.registry.activate(identifier) {
                self.diagnostics.record(
                    Diagnostic::error(
                        DiagnosticCode::RegistryFailure,
                        format!("Failed to activate '{identifier}': {e}"),
                    )
                    .for_item(identifier),
                );
                return DecisionAction::Activate;
            }
        }
        self.overlay.insert(identifier.to_string(), true);
        DecisionAction::Activate
    }

    fn deactivate(&mut self, identifier: &str) -> DecisionAction {
        if !self.is_active(identifier) {
            return DecisionAction::Skip;
        }

        let target = BTreeSet::from([identifier.to_string()]);
        if self.apply_deactivation(&target) {
            self.overlay.insert(identifier.to_string(), false);
        }
        self.activated.remove(identifier);
        DecisionAction::Deactivate
    }

    /// Issue a deactivation unless dry-running. False when the registry refused.
    fn apply_deactivation(&self, identifiers: &BTreeSet<String>) -> bool {
        if self.mode == ApplyMode::DryRun {
            return true;
        }
        match self.registry.deactivate(identifiers) {
            Ok(()) => true,
            Err(e) => {
                let names: Vec<&str> = identifiers.iter().map(String::as_str).collect();
                self.diagnostics.record(Diagnostic::error(
                    DiagnosticCode::RegistryFailure,
                    format!("Failed to deactivate {}: {e}", names.join(", ")),
                ));
                false
            }
        }
    }
}
