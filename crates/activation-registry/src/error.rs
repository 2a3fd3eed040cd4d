//! Registry error types

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Activation refused for {identifier}: {reason}")]
    ActivationRefused { identifier: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
