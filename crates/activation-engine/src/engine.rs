//! Activation engine
//!
//! Ties the pieces into one synchronous run per tenant key:
//!
//! 1. load the configuration (through the cache when enabled)
//! 2. build the ordered plan
//! 3. prune active items the plan does not list
//! 4. report version mismatches
//! 5. reconcile the immediate entries, then the deferred ones
//!
//! An empty plan stops after step 2. Nothing in a run fails the run; every
//! problem ends up in the diagnostics sink.

use crate::cache::ConfigCache;
use crate::collectors::{CollectContext, IdentifierShape};
use crate::config::ActivationConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsSink, TracingSink};
use crate::error::{EngineError, Result, SourceError};
use crate::lookup::{EnvironmentIdentity, FieldLookup, MapFieldLookup, StaticEnvironment};
use crate::plan::{Plan, PlanBuilder};
use crate::reconcile::{ApplyMode, ReconciliationOutcome, Reconciler};
use crate::settings::EngineSettings;
use crate::source::ConfigSource;
use activation_registry::RegistryView;
use activation_types::{ActivationPass, ReconciliationDecision, VersionIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Everything one run decided
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationReport {
    pub run_id: Uuid,
    pub key: String,
    pub planned_at: DateTime<Utc>,
    pub mode: ApplyMode,
    pub plan: Plan,
    /// Active items deactivated for not being listed
    pub pruned: Vec<String>,
    pub version_issues: Vec<VersionIssue>,
    pub immediate: ReconciliationOutcome,
    pub deferred: ReconciliationOutcome,
}

impl ActivationReport {
    fn new(run_id: Uuid, key: &str, mode: ApplyMode, plan: Plan) -> Self {
        Self {
            run_id,
            key: key.to_string(),
            planned_at: Utc::now(),
            mode,
            plan,
            pruned: Vec::new(),
            version_issues: Vec::new(),
            immediate: ReconciliationOutcome::new(ActivationPass::Immediate),
            deferred: ReconciliationOutcome::new(ActivationPass::Deferred),
        }
    }

    /// Decisions of both passes, immediate first
    pub fn decisions(&self) -> impl Iterator<Item = &ReconciliationDecision> {
        self.immediate
            .decisions
            .iter()
            .chain(self.deferred.decisions.iter())
    }

    /// Whether the run issued (or in dry-run would issue) any registry call
    pub fn changed_registry(&self) -> bool {
        !self.pruned.is_empty() || self.decisions().any(ReconciliationDecision::changed_registry)
    }
}

/// The activation planning engine
pub struct ActivationEngine {
    source: Arc<dyn ConfigSource>,
    registry: Arc<dyn RegistryView>,
    environment: Arc<dyn EnvironmentIdentity>,
    fields: Arc<dyn FieldLookup>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    cache: Option<Arc<ConfigCache<ActivationConfig>>>,
    settings: EngineSettings,
    shape: IdentifierShape,
}

impl ActivationEngine {
    pub fn builder() -> ActivationEngineBuilder {
        ActivationEngineBuilder::new()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&Arc<ConfigCache<ActivationConfig>>> {
        self.cache.as_ref()
    }

    /// Typed configuration for `key`; a source failure yields an empty one
    pub fn config(&self, key: &str) -> Arc<ActivationConfig> {
        match &self.cache {
            Some(cache) => cache.get_or_populate(key, || self.fetch(key)),
            None => Arc::new(self.fetch(key)),
        }
    }

    /// Ordered plan for `key`, without touching the registry
    pub fn plan(&self, key: &str) -> Plan {
        let config = self.config(key);
        let ctx = CollectContext {
            fields: self.fields.as_ref(),
            environment: self.environment.as_ref(),
            diagnostics: self.diagnostics.as_ref(),
        };
        PlanBuilder::from_config(&config, &self.shape).build(&ctx)
    }

    /// Plan and reconcile `key` against the registry
    pub fn run(&self, key: &str) -> ActivationReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("activation_run", %run_id, key);
        let _enter = span.enter();

        let mode = ApplyMode::from_dry_run(self.settings.dry_run);
        let plan = self.plan(key);
        if plan.is_empty() {
            tracing::info!("Plan is empty, nothing to reconcile");
            return ActivationReport::new(run_id, key, mode, plan);
        }

        let mut reconciler =
            Reconciler::new(self.registry.as_ref(), self.diagnostics.as_ref()).with_mode(mode);

        let pruned = reconciler.prune_unlisted(&plan);
        let version_issues = reconciler.check_versions(&plan);

        let (immediate, deferred) = plan.partition();
        let immediate = reconciler.reconcile(&immediate, ActivationPass::Immediate);
        let deferred = if self.settings.process_deferred {
            reconciler.reconcile(&deferred, ActivationPass::Deferred)
        } else {
            if !deferred.is_empty() {
                tracing::debug!(count = deferred.len(), "Deferred pass left to the host");
            }
            ReconciliationOutcome::new(ActivationPass::Deferred)
        };

        tracing::info!(
            planned = plan.len(),
            pruned = pruned.len(),
            version_issues = version_issues.len(),
            mode = ?mode,
            "Activation run complete"
        );

        ActivationReport {
            pruned,
            version_issues,
            immediate,
            deferred,
            ..ActivationReport::new(run_id, key, mode, plan)
        }
    }

    /// Drop the cached configuration for `key`
    pub fn invalidate(&self, key: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(key);
        }
    }

    /// Drop every cached configuration
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    fn fetch(&self, key: &str) -> ActivationConfig {
        match self.source.load(key) {
            Ok(document) => ActivationConfig::from_value(&document, self.diagnostics.as_ref()),
            Err(SourceError::NotFound(_)) => {
                tracing::debug!(key, "No activation configuration");
                ActivationConfig::default()
            }
            Err(e) => {
                self.diagnostics.record(Diagnostic::warning(
                    DiagnosticCode::MalformedConfig,
                    format!("Activation configuration for '{key}' unusable, treating as empty: {e}"),
                ));
                ActivationConfig::default()
            }
        }
    }
}

impl std::fmt::Debug for ActivationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationEngine")
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActivationEngine`]
///
/// The source and registry are required. Everything else has a default:
/// an empty environment identity, an empty field table, a [`TracingSink`],
/// a private cache (when enabled in settings) and default settings.
#[derive(Default)]
pub struct ActivationEngineBuilder {
    source: Option<Arc<dyn ConfigSource>>,
    registry: Option<Arc<dyn RegistryView>>,
    environment: Option<Arc<dyn EnvironmentIdentity>>,
    fields: Option<Arc<dyn FieldLookup>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    cache: Option<Arc<ConfigCache<ActivationConfig>>>,
    settings: Option<EngineSettings>,
}

impl ActivationEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration source
    pub fn with_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the item registry
    pub fn with_registry(mut self, registry: Arc<dyn RegistryView>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the environment identity
    pub fn with_environment(mut self, environment: Arc<dyn EnvironmentIdentity>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Set the field lookup used by predicate rules
    pub fn with_fields(mut self, fields: Arc<dyn FieldLookup>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Set the diagnostics sink
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Share a configuration cache with other engines
    pub fn with_cache(mut self, cache: Arc<ConfigCache<ActivationConfig>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the engine settings
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<ActivationEngine> {
        let source = self.source.ok_or(EngineError::MissingComponent("source"))?;
        let registry = self
            .registry
            .ok_or(EngineError::MissingComponent("registry"))?;
        let settings = self.settings.unwrap_or_default();

        let cache = if settings.cache_enabled {
            Some(self.cache.unwrap_or_default())
        } else {
            None
        };

        Ok(ActivationEngine {
            source,
            registry,
            environment: self
                .environment
                .unwrap_or_else(|| Arc::new(StaticEnvironment::default())),
            fields: self
                .fields
                .unwrap_or_else(|| Arc::new(MapFieldLookup::new())),
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(TracingSink)),
            cache,
            shape: IdentifierShape::with_suffix(settings.item_suffix.clone()),
            settings,
        })
    }
}
