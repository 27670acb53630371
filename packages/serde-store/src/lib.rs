//! Serde Integration for clinicdb
//!
//! This layer provides typed access to clinicdb stores via serde. It adds:
//! - `TypedDatabase`: Read and write Rust types directly
//! - `Value` <-> serde conversions, and `Value` <-> `serde_json::Value`
//!
//! # Example
//!
//! ```rust,ignore
//! use clinicdb_serde::TypedDatabase;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Doctor {
//!     name: String,
//!     speciality: String,
//! }
//!
//! fn read_doctor(db: &dyn Database, id: &str) -> Result<Option<Doctor>, Error> {
//!     db.get_as(&path!("doctors").child(id)?)
//! }
//! ```
//!
//! # Async Support
//!
//! Enable the `async` feature for `AsyncTypedDatabase`.

mod convert;
mod typed;

pub use convert::{from_value, json_to_value, to_patch, to_value, value_to_json};
pub use typed::TypedDatabase;

// Re-export core types for convenience
pub use clinicdb_core::{Database, Error, Path, PathError, Snapshot, Value};

// Async support
#[cfg(feature = "async")]
mod async_typed;

#[cfg(feature = "async")]
pub use async_typed::AsyncTypedDatabase;

#[cfg(feature = "async")]
pub use clinicdb_core::{AsyncDatabase, SyncToAsync};
