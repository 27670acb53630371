//! Store configuration loaded from JSON.

use std::io;
use std::path::{Path as FsPath, PathBuf};

use clinicdb_core::PathError;
use serde::{Deserialize, Serialize};

use crate::rules::AccessRules;

/// Configuration for a `MemoryDatabase`.
///
/// ```json
/// {
///   "rules": { "writeDenied": ["audit"] },
///   "seed": { "doctors": { "d1": { "name": "Dr. Rao" } } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub rules: AccessRules,
    /// Initial contents of the store, written at the root.
    pub seed: Option<serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid rule prefix: {0}")]
    Rule(#[from] PathError),
    #[error("invalid seed data: {0}")]
    Seed(#[from] clinicdb_core::Error),
}

impl StoreConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Reading config {}...", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}
