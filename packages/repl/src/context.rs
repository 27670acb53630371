//! Shell state: the store and the active watches.

use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use clinicdb_access::{Fetch, FetchState};
use clinicdb_core::{Database, Path, PathError, Value};
use clinicdb_memory::{ConfigError, MemoryDatabase, StoreConfig};
use tokio::sync::watch;

/// Errors while setting up the shell.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not read seed file {path}: {source}")]
    SeedIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid seed file {path}: {source}")]
    SeedParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// `doctors`, `/doctors` and `/doctors/` all name one watch.
fn watch_key(path: &str) -> Result<String, PathError> {
    Ok(format!("/{}", Path::parse(path)?))
}

/// A live read opened by `watch`.
struct Watch {
    // Held for its subscription; dropping it unsubscribes.
    _fetch: Fetch<Option<Value>>,
    changes: watch::Receiver<FetchState<Option<Value>>>,
}

/// State carried between shell commands.
pub struct ShellContext {
    db: Arc<MemoryDatabase>,
    watches: BTreeMap<String, Watch>,
}

impl ShellContext {
    pub fn new(db: MemoryDatabase) -> Self {
        Self {
            db: Arc::new(db),
            watches: BTreeMap::new(),
        }
    }

    /// Build the store from an optional config file and an optional seed
    /// file. A seed file replaces the config's seed.
    pub fn load(config: Option<&FsPath>, seed: Option<&FsPath>) -> Result<Self, ContextError> {
        let mut store_config = match config {
            Some(path) => StoreConfig::from_file(path)?,
            None => StoreConfig::default(),
        };

        if let Some(path) = seed {
            log::debug!("Reading seed {}...", path.display());
            let contents = std::fs::read_to_string(path).map_err(|source| ContextError::SeedIo {
                path: path.to_path_buf(),
                source,
            })?;
            let json = serde_json::from_str(&contents).map_err(|source| {
                ContextError::SeedParse {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            store_config.seed = Some(json);
        }

        Ok(Self::new(MemoryDatabase::from_config(&store_config)?))
    }

    /// The store as the data access utilities see it.
    pub fn db(&self) -> Arc<dyn Database> {
        self.db.clone()
    }

    pub fn store(&self) -> &MemoryDatabase {
        &self.db
    }

    /// Start watching `path`, keyed by its normalized form.
    ///
    /// Returns the key and the first state, or `None` in place of the state
    /// if the path is already watched.
    pub fn watch(
        &mut self,
        path: &str,
    ) -> Result<(String, Option<FetchState<Option<Value>>>), PathError> {
        let key = watch_key(path)?;
        if self.watches.contains_key(&key) {
            return Ok((key, None));
        }
        let fetch = Fetch::new(self.db(), key.as_str(), Ok);
        let changes = fetch.watch();
        let state = fetch.state();
        self.watches.insert(
            key.clone(),
            Watch {
                _fetch: fetch,
                changes,
            },
        );
        Ok((key, Some(state)))
    }

    /// Stop watching `path`. Returns `false` if it was not watched.
    pub fn unwatch(&mut self, path: &str) -> bool {
        match watch_key(path) {
            Ok(key) => self.watches.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn watched_paths(&self) -> Vec<&str> {
        self.watches.keys().map(String::as_str).collect()
    }

    /// Watches whose state changed since the last call, with the new state.
    pub fn take_changes(&mut self) -> Vec<(String, FetchState<Option<Value>>)> {
        let mut changed = Vec::new();
        for (path, w) in self.watches.iter_mut() {
            if w.changes.has_changed().unwrap_or(false) {
                changed.push((path.clone(), w.changes.borrow_and_update().clone()));
            }
        }
        changed
    }
}
