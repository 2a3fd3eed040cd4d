//! Engine error types
//!
//! A planning run never fails as a whole. These errors belong to the
//! surfaces around it: loading a configuration document, loading engine
//! settings, and installing the tracing subscriber.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Configuration not found for key: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode configuration for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Missing required component: {0}")]
    MissingComponent(&'static str),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
