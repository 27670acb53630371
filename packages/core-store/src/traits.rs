//! The realtime store client trait.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{Error, Path, Snapshot, Value};

/// Callback invoked for every snapshot of a subscribed path.
///
/// An `Err` cancels the subscription: the store delivers no further events
/// to this listener.
pub type Listener = Arc<dyn Fn(Result<Snapshot, Error>) + Send + Sync>;

/// Handle for one registered listener.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Client for a realtime hierarchical key-value store.
///
/// These are the primitives the data access layer is built on: live
/// subscription, overwrite, generate-key-and-set, shallow-merge update and
/// delete, plus a one-shot read. A single client is shared by every caller,
/// so all methods take `&self`.
///
/// # Object Safety
///
/// This trait is object-safe: inject it as `Arc<dyn Database>`.
pub trait Database: Send + Sync {
    /// Read the value at a path once.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing is stored at the path.
    /// * `Ok(Some(value))` - The value at the path.
    /// * `Err(Error)` - An error occurred.
    fn get(&self, path: &Path) -> Result<Option<Value>, Error>;

    /// Overwrite the value at a path. Writing `Value::Null` removes it.
    fn set(&self, path: &Path, value: Value) -> Result<(), Error>;

    /// Store a value under a new, store-generated key below `path`.
    ///
    /// Returns the generated key. Keys are unique and sort in creation order.
    fn push(&self, path: &Path, value: Value) -> Result<String, Error>;

    /// Merge `patch` into the value at `path`.
    ///
    /// Each patch key replaces that child only; siblings are untouched. A
    /// `Null` entry deletes its child. Keys may be relative paths such as
    /// `"profile/phone"`.
    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error>;

    /// Delete the value at a path. Deleting nothing is not an error.
    fn remove(&self, path: &Path) -> Result<(), Error>;

    /// Register a listener for the value at `path`.
    ///
    /// The listener receives the current value right away and then every
    /// change to it, until `unsubscribe` is called or an error is delivered.
    /// A subscription the store refuses returns the error, and may also
    /// deliver it to the listener; nothing is left to unsubscribe.
    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error>;

    /// Release a listener. Returns `false` if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// Blanket implementations for references and smart pointers

impl<T: Database + ?Sized> Database for &T {
    fn get(&self, path: &Path) -> Result<Option<Value>, Error> {
        (**self).get(path)
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), Error> {
        (**self).set(path, value)
    }

    fn push(&self, path: &Path, value: Value) -> Result<String, Error> {
        (**self).push(path, value)
    }

    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error> {
        (**self).update(path, patch)
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        (**self).remove(path)
    }

    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error> {
        (**self).subscribe(path, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}

impl<T: Database + ?Sized> Database for Box<T> {
    fn get(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.as_ref().get(path)
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.as_ref().set(path, value)
    }

    fn push(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.as_ref().push(path, value)
    }

    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error> {
        self.as_ref().update(path, patch)
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        self.as_ref().remove(path)
    }

    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error> {
        self.as_ref().subscribe(path, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.as_ref().unsubscribe(id)
    }
}

impl<T: Database + ?Sized> Database for Arc<T> {
    fn get(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.as_ref().get(path)
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.as_ref().set(path, value)
    }

    fn push(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.as_ref().push(path, value)
    }

    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error> {
        self.as_ref().update(path, patch)
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        self.as_ref().remove(path)
    }

    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error> {
        self.as_ref().subscribe(path, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.as_ref().unsubscribe(id)
    }
}
