//! Data access for clinic records in a realtime store.
//!
//! Two utilities sit on top of an injected `Arc<dyn Database>`:
//! - `Fetch`: subscribe to a path and keep a derived state current, with
//!   `use_fetch` shaping keyed collections into lists
//! - `mutate_data`: run a create, createWithId, update or delete and get a
//!   `MutationResult` back instead of an error
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use clinicdb_access::{fetch_collection, mutate_data, FetchState, MutateRequest};
//! use clinicdb_core::Database;
//! use clinicdb_memory::MemoryDatabase;
//!
//! let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
//! let labs = fetch_collection::<String>(db.clone(), "labs");
//! assert_eq!(labs.state(), FetchState::Ready(vec![]));
//!
//! mutate_data(db.as_ref(), MutateRequest::create_with_id("labs", "Central"));
//! assert_eq!(labs.data(), Some(vec!["Central".to_string()]));
//! ```

mod fetch;
mod mutate;

pub use fetch::{
    collect_values, fetch_collection, fetch_collection_filtered, fetch_one, use_fetch, Fetch,
    FetchOptions, FetchState, Filter,
};
pub use mutate::{mutate_data, try_mutate, Action, MutateRequest, MutationResult};

#[cfg(feature = "async")]
pub use mutate::{mutate_data_async, try_mutate_async};

pub use clinicdb_core::{Database, Error, Path, Value};
