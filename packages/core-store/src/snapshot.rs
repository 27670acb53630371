//! What a live subscription delivers.

use crate::{Path, Value};

/// The value at a subscribed path at one point in time.
///
/// `value` is `None` when nothing is stored at the path; the store signals
/// "no data" explicitly rather than staying silent.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    path: Path,
    value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: Path, value: Option<Value>) -> Self {
        Self { path, value }
    }

    /// The path this snapshot was taken at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The key of the snapshot's location, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.path.last()
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}
