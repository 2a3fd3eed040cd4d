//! Diagnostics sink
//!
//! Everything the planner wants a human to know about (malformed
//! configuration, missing items, version mismatches, pruned items) goes
//! through a [`DiagnosticsSink`]. Recording is fire-and-forget.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A configuration document or section had the wrong shape
    MalformedConfig,
    /// A single item entry or rule was dropped
    InvalidEntry,
    /// A predicate named an operator outside the fixed set
    UnknownOperator,
    /// A required item is not installed
    RequiredMissing,
    /// An optional item is not installed
    OptionalMissing,
    /// An installed item fails its version constraint
    VersionMismatch,
    /// Active items absent from the plan were deactivated
    Pruned,
    /// The registry rejected an activation or deactivation
    RegistryFailure,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedConfig => "malformed_config",
            Self::InvalidEntry => "invalid_entry",
            Self::UnknownOperator => "unknown_operator",
            Self::RequiredMissing => "required_missing",
            Self::OptionalMissing => "optional_missing",
            Self::VersionMismatch => "version_mismatch",
            Self::Pruned => "pruned",
            Self::RegistryFailure => "registry_failure",
        };
        f.write_str(name)
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Item the message is about, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            identifier: None,
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn for_item(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// Receiver of planner diagnostics
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at the matching level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        let code = diagnostic.code.to_string();
        let identifier = diagnostic.identifier.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Info => {
                tracing::info!(code = %code, identifier, "{}", diagnostic.message)
            }
            Severity::Warning => {
                tracing::warn!(code = %code, identifier, "{}", diagnostic.message)
            }
            Severity::Error => {
                tracing::error!(code = %code, identifier, "{}", diagnostic.message)
            }
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded diagnostics, oldest first
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Recorded diagnostics with the given code
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.code == code)
            .cloned()
            .collect()
    }

    /// Drain all recorded diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}
