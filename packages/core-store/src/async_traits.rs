//! Async traits for the core layer.
//!
//! `AsyncDatabase` is the async version of the one-shot primitives of
//! `Database`, for store clients whose writes are network round trips.
//! Subscriptions stay callback-based and live on `Database`.
//!
//! Enable the `async` feature to use these traits:
//!
//! ```toml
//! [dependencies]
//! clinicdb-core = { version = "0.1", features = ["async"] }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Database, Error, Path, Value};

/// Async version of the read and write primitives of `Database`.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn AsyncDatabase>`.
///
/// # Example
///
/// ```rust,ignore
/// use clinicdb_core::{AsyncDatabase, Error, Value, path};
///
/// async fn book_ambulance(db: &dyn AsyncDatabase, booking: Value) -> Result<String, Error> {
///     db.push_async(&path!("ambulanceBookings"), booking).await
/// }
/// ```
#[async_trait]
pub trait AsyncDatabase: Send + Sync {
    async fn get_async(&self, path: &Path) -> Result<Option<Value>, Error>;

    async fn set_async(&self, path: &Path, value: Value) -> Result<(), Error>;

    async fn push_async(&self, path: &Path, value: Value) -> Result<String, Error>;

    async fn update_async(
        &self,
        path: &Path,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), Error>;

    async fn remove_async(&self, path: &Path) -> Result<(), Error>;
}

#[async_trait]
impl<T: AsyncDatabase + ?Sized> AsyncDatabase for Arc<T> {
    async fn get_async(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.as_ref().get_async(path).await
    }

    async fn set_async(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.as_ref().set_async(path, value).await
    }

    async fn push_async(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.as_ref().push_async(path, value).await
    }

    async fn update_async(
        &self,
        path: &Path,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), Error> {
        self.as_ref().update_async(path, patch).await
    }

    async fn remove_async(&self, path: &Path) -> Result<(), Error> {
        self.as_ref().remove_async(path).await
    }
}

/// Adapter to use a sync `Database` where an `AsyncDatabase` is expected.
///
/// The wrapped store is shared, so the same instance can keep serving
/// subscriptions through its sync interface. Calls complete without
/// yielding; for a store with real I/O implement `AsyncDatabase` directly.
///
/// # Example
///
/// ```rust,ignore
/// use clinicdb_core::SyncToAsync;
///
/// let db = Arc::new(MemoryDatabase::new());
/// let async_db = SyncToAsync::new(db.clone());
/// ```
pub struct SyncToAsync<T: ?Sized> {
    inner: Arc<T>,
}

impl<T: ?Sized> SyncToAsync<T> {
    /// Create a new adapter around a shared sync store.
    pub fn new(inner: Arc<T>) -> Self {
        Self { inner }
    }

    /// Get the wrapped store.
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }
}

impl<T: ?Sized> Clone for SyncToAsync<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[async_trait]
impl<T: Database + ?Sized> AsyncDatabase for SyncToAsync<T> {
    async fn get_async(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.inner.get(path)
    }

    async fn set_async(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.inner.set(path, value)
    }

    async fn push_async(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.inner.push(path, value)
    }

    async fn update_async(
        &self,
        path: &Path,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), Error> {
        self.inner.update(path, patch)
    }

    async fn remove_async(&self, path: &Path) -> Result<(), Error> {
        self.inner.remove(path)
    }
}
