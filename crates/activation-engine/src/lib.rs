//! # Activation Engine
//!
//! Declarative activation planner: decides which registry items should be
//! active, in which order, from a set of conditional rule sources.
//!
//! ## Overview
//!
//! A run goes through four stages:
//!
//! - **Normalize**: heterogeneous item lists become uniform [`ItemSpec`]s
//!   ([`Normalizer`])
//! - **Collect**: four rule collectors turn configuration into plan
//!   candidates ([`Collector`])
//! - **Plan**: candidates are merged and stable-sorted by order ([`PlanBuilder`])
//! - **Reconcile**: the plan is compared against the registry and the needed
//!   activate/deactivate calls are issued ([`Reconciler`])
//!
//! Nothing in a run is fatal. Malformed configuration, missing items and
//! version mismatches are reported through a [`DiagnosticsSink`] and the run
//! carries on with whatever is still usable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use activation_engine::{ActivationEngine, JsonFileSource, MemorySink, StaticEnvironment};
//! use activation_registry::InMemoryRegistry;
//!
//! let registry = Arc::new(InMemoryRegistry::new().with_item("seo/seo.php", Some("2.1.0")));
//! let diagnostics = Arc::new(MemorySink::new());
//!
//! let engine = ActivationEngine::builder()
//!     .with_source(Arc::new(JsonFileSource::directory("/etc/activation")))
//!     .with_registry(registry)
//!     .with_environment(Arc::new(StaticEnvironment::new("https://example.test")))
//!     .with_diagnostics(diagnostics.clone())
//!     .build()
//!     .unwrap();
//!
//! let report = engine.run("site-1");
//! for decision in report.decisions() {
//!     println!("{} -> {:?} ({:?})", decision.identifier, decision.action, decision.reason);
//! }
//! for diagnostic in diagnostics.take() {
//!     println!("[{:?}] {}", diagnostic.severity, diagnostic.message);
//! }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cache;
pub mod collectors;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod normalize;
pub mod plan;
pub mod reconcile;
pub mod settings;
pub mod source;
pub mod telemetry;
pub mod version;

// Re-exports
pub use cache::ConfigCache;
pub use collectors::{
    CollectContext, Collector, DirectCollector, EnvironmentCollector, EnvironmentGroup,
    IdentifierShape, ItemEntry, PredicateCollector, PredicateRule, RuleOperator,
    TriggerCollector, TriggerRule,
};
pub use config::ActivationConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink, MemorySink, Severity, TracingSink};
pub use engine::{ActivationEngine, ActivationEngineBuilder, ActivationReport};
pub use error::{EngineError, Result, SourceError};
pub use lookup::{EnvironmentIdentity, FieldLookup, MapFieldLookup, StaticEnvironment};
pub use normalize::{normalize, Normalizer};
pub use plan::{Plan, PlanBuilder};
pub use reconcile::{ApplyMode, ReconciliationOutcome, Reconciler};
pub use settings::{EngineSettings, LoggingConfig};
pub use source::{ConfigSource, JsonFileSource, StaticSource};
pub use telemetry::init_tracing;
pub use version::{compare_versions, satisfies, Comparator, VersionConstraint};

pub use activation_types::ItemSpec;
