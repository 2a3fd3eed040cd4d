//! Engine settings

use activation_types::defaults;
use serde::{Deserialize, Serialize};

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Suffix required of direct and environment item identifiers; empty disables the check
    #[serde(default = "default_item_suffix")]
    pub item_suffix: String,

    /// Cache decoded configuration per tenant key
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Reconcile deferred items in the same run
    #[serde(default = "default_true")]
    pub process_deferred: bool,

    /// Compute decisions without touching the registry
    #[serde(default)]
    pub dry_run: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            item_suffix: default_item_suffix(),
            cache_enabled: true,
            process_deferred: true,
            dry_run: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_item_suffix() -> String {
    defaults::ITEM_SUFFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineSettings {
    /// Load settings: defaults, then the optional file, then `ACTIVATION_*`
    /// environment variables (`ACTIVATION_DRY_RUN`, `ACTIVATION_LOGGING__LEVEL`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&EngineSettings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ACTIVATION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Settings that never touch the registry
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.item_suffix, ".php");
        assert!(settings.cache_enabled);
        assert!(settings.process_deferred);
        assert!(!settings.dry_run);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activation.toml");
        std::fs::write(
            &path,
            "item_suffix = \".so\"\ncache_enabled = false\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let settings = EngineSettings::load(path.to_str()).unwrap();
        assert_eq!(settings.item_suffix, ".so");
        assert!(!settings.cache_enabled);
        assert!(settings.process_deferred);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let settings = EngineSettings::load(path.to_str()).unwrap();
        assert_eq!(settings.item_suffix, defaults::ITEM_SUFFIX);
    }

    #[test]
    fn test_dry_run_settings() {
        assert!(EngineSettings::dry_run().dry_run);
    }
}
