//! Typed extension trait for store clients.

use serde::de::DeserializeOwned;
use serde::Serialize;

use clinicdb_core::{Database, Error, Path};

use crate::convert::{from_value, to_patch, to_value};

/// Extension trait for typed reads and writes.
///
/// This trait is automatically implemented for all `Database` implementations,
/// including `dyn Database`.
///
/// # Example
///
/// ```rust,ignore
/// use clinicdb_serde::TypedDatabase;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Expense {
///     title: String,
///     amount: i64,
/// }
///
/// fn add_expense(db: &dyn Database, expense: &Expense) -> Result<String, Error> {
///     db.push_as(&path!("expenses"), expense)
/// }
/// ```
pub trait TypedDatabase: Database {
    /// Read a value and deserialize it into a Rust type.
    fn get_as<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, Error> {
        let Some(value) = self.get(path)? else {
            return Ok(None);
        };
        from_value(value).map(Some)
    }

    /// Read a value as a serde_json::Value.
    ///
    /// Convenience method when you don't know the exact type.
    fn get_json(&self, path: &Path) -> Result<Option<serde_json::Value>, Error> {
        self.get_as(path)
    }

    /// Serialize a Rust type and overwrite the value at `path` with it.
    fn set_as<T: Serialize + ?Sized>(&self, path: &Path, data: &T) -> Result<(), Error> {
        self.set(path, to_value(data)?)
    }

    /// Serialize a Rust type and store it under a generated key.
    fn push_as<T: Serialize + ?Sized>(&self, path: &Path, data: &T) -> Result<String, Error> {
        self.push(path, to_value(data)?)
    }

    /// Serialize a Rust type and shallow-merge its fields into `path`.
    fn update_as<T: Serialize + ?Sized>(&self, path: &Path, data: &T) -> Result<(), Error> {
        self.update(path, to_patch(data)?)
    }
}

// Blanket implementation for all stores
impl<D: Database + ?Sized> TypedDatabase for D {}
