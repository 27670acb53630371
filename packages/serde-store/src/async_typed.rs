//! Async typed extension trait.
//!
//! Enable the `async` feature to use this trait:
//!
//! ```toml
//! [dependencies]
//! clinicdb-serde = { version = "0.1", features = ["async"] }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use clinicdb_core::{AsyncDatabase, Error, Path};

use crate::convert::{from_value, to_patch, to_value};

/// Async extension trait for typed reads and writes.
///
/// This trait is automatically implemented for all `AsyncDatabase`
/// implementations. Payloads are converted before the first await.
#[async_trait]
pub trait AsyncTypedDatabase: AsyncDatabase {
    async fn get_as_async<T: DeserializeOwned + Send>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, Error> {
        let Some(value) = self.get_async(path).await? else {
            return Ok(None);
        };
        from_value(value).map(Some)
    }

    async fn set_as_async<T: Serialize + Sync + ?Sized>(
        &self,
        path: &Path,
        data: &T,
    ) -> Result<(), Error> {
        let value = to_value(data)?;
        self.set_async(path, value).await
    }

    async fn push_as_async<T: Serialize + Sync + ?Sized>(
        &self,
        path: &Path,
        data: &T,
    ) -> Result<String, Error> {
        let value = to_value(data)?;
        self.push_async(path, value).await
    }

    async fn update_as_async<T: Serialize + Sync + ?Sized>(
        &self,
        path: &Path,
        data: &T,
    ) -> Result<(), Error> {
        let patch = to_patch(data)?;
        self.update_async(path, patch).await
    }
}

// Blanket implementation for all async stores
impl<D: AsyncDatabase + ?Sized> AsyncTypedDatabase for D {}
