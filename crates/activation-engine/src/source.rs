//! Configuration sources
//!
//! A [`ConfigSource`] hands the engine an already-decoded JSON document for
//! a tenant key. Sources report failures as [`SourceError`]; the engine turns
//! any failure into an empty configuration.

use crate::error::SourceError;
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Provider of activation configuration documents
pub trait ConfigSource: Send + Sync {
    fn load(&self, key: &str) -> Result<Value, SourceError>;
}

/// Where a [`JsonFileSource`] finds its documents
#[derive(Debug, Clone)]
enum Layout {
    /// One `<key>.json` per tenant
    Directory(PathBuf),
    /// The same file for every tenant
    File(PathBuf),
}

/// Reads configuration documents from JSON files
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    layout: Layout,
}

impl JsonFileSource {
    /// One `<key>.json` file per tenant under `dir`
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::Directory(dir.into()),
        }
    }

    /// A single file shared by all tenants
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::File(path.into()),
        }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        match &self.layout {
            Layout::File(path) => Some(path.clone()),
            Layout::Directory(dir) => {
                let valid = !key.is_empty()
                    && key
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                    && !key.starts_with('.');
                valid.then(|| dir.join(format!("{key}.json")))
            }
        }
    }

    fn read(path: &Path, key: &str) -> Result<Value, SourceError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(key.to_string()));
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&contents).map_err(|source| SourceError::Decode {
            key: key.to_string(),
            source,
        })
    }
}

impl ConfigSource for JsonFileSource {
    fn load(&self, key: &str) -> Result<Value, SourceError> {
        let path = self
            .path_for(key)
            .ok_or_else(|| SourceError::NotFound(key.to_string()))?;
        tracing::debug!(key, path = %path.display(), "Loading activation configuration");
        Self::read(&path, key)
    }
}

/// In-memory configuration documents
#[derive(Debug, Default)]
pub struct StaticSource {
    documents: DashMap<String, Value>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, key: impl Into<String>, document: Value) -> Self {
        self.insert(key, document);
        self
    }

    pub fn insert(&self, key: impl Into<String>, document: Value) {
        self.documents.insert(key.into(), document);
    }
}

impl ConfigSource for StaticSource {
    fn load(&self, key: &str) -> Result<Value, SourceError> {
        self.documents
            .get(key)
            .map(|doc| doc.value().clone())
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }
}
