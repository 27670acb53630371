//! Core clinicdb: the realtime store client contract.
//!
//! This crate defines the vocabulary shared by every other clinicdb crate:
//! - `Path`: Validated slash-delimited address into the hierarchical store
//! - `Value`: Parsed tree structure stored at a path
//! - `Snapshot`: What a live subscription delivers
//! - `Database`: The five store primitives (subscribe, set, push, update,
//!   remove) plus one-shot reads and unsubscription
//!
//! Concrete stores (the in-memory one used by tests and the shell, or a
//! client for a remote realtime service) implement `Database`. The data
//! access utilities only ever see an injected `Arc<dyn Database>`.
//!
//! # Example
//!
//! ```rust
//! use clinicdb_core::{Database, Error, Value, path};
//!
//! fn register_patient(db: &dyn Database, name: &str) -> Result<String, Error> {
//!     db.push(&path!("patients"), Value::from(name))
//! }
//! ```

mod error;
mod path;
mod snapshot;
mod traits;
mod value;

pub use error::{Error, Operation};
pub use path::{Path, PathError, MAX_DEPTH, MAX_KEY_BYTES};
pub use snapshot::Snapshot;
pub use traits::{Database, Listener, SubscriptionId};
pub use value::Value;

// Async support
#[cfg(feature = "async")]
mod async_traits;

#[cfg(feature = "async")]
pub use async_traits::{AsyncDatabase, SyncToAsync};
