pub mod config;
pub mod in_memory;
pub mod push_id;
pub mod rules;
pub mod value_utils;

pub use clinicdb_core::{Path, PathError};

pub use config::{ConfigError, StoreConfig};
pub use in_memory::MemoryDatabase;
pub use push_id::{PushIdGenerator, PUSH_ID_LEN};
pub use rules::{AccessRules, Rules};
