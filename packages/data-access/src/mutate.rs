//! One-shot writes with a uniform result.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clinicdb_core::{Database, Error, Path, Value};
use clinicdb_serde::to_value;
use serde::{Deserialize, Serialize};

/// The kind of write a `MutateRequest` performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Overwrite the value at the path.
    Create,
    /// Store under a new generated key below the path.
    CreateWithId,
    /// Shallow-merge a map into the value at the path.
    Update,
    /// Remove the value at the path.
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::CreateWithId => "createWithId",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    fn needs_data(self) -> bool {
        !matches!(self, Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "createWithId" => Ok(Action::CreateWithId),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(Error::invalid_request(format!("unknown action '{}'", other))),
        }
    }
}

/// A single write against the store.
#[derive(Clone, Debug, PartialEq)]
pub struct MutateRequest {
    pub path: String,
    /// Ignored for `Delete`.
    pub data: Option<Value>,
    pub action: Action,
}

impl MutateRequest {
    pub fn create(path: impl Into<String>, data: impl Into<Value>) -> Self {
        Self::with_data(path, Action::Create, data.into())
    }

    pub fn create_with_id(path: impl Into<String>, data: impl Into<Value>) -> Self {
        Self::with_data(path, Action::CreateWithId, data.into())
    }

    pub fn update(path: impl Into<String>, data: impl Into<Value>) -> Self {
        Self::with_data(path, Action::Update, data.into())
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
            action: Action::Delete,
        }
    }

    /// Build a request from serializable data.
    pub fn typed<T: Serialize + ?Sized>(
        path: impl Into<String>,
        action: Action,
        data: &T,
    ) -> Result<Self, Error> {
        Ok(Self::with_data(path, action, to_value(data)?))
    }

    /// Build a request from an action name such as `"createWithId"`.
    pub fn parse(path: impl Into<String>, action: &str, data: Option<Value>) -> Result<Self, Error> {
        Ok(Self {
            path: path.into(),
            data,
            action: action.parse()?,
        })
    }

    fn with_data(path: impl Into<String>, action: Action, data: Value) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
            action,
        }
    }
}

/// Outcome of `mutate_data`. Serializes as `{success, error?, id?}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The generated key, for `CreateWithId` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MutationResult {
    pub fn ok(id: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            id,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            id: None,
        }
    }
}

impl From<Result<Option<String>, Error>> for MutationResult {
    fn from(result: Result<Option<String>, Error>) -> Self {
        match result {
            Ok(id) => MutationResult::ok(id),
            Err(e) => MutationResult::failed(e),
        }
    }
}

/// A validated request, ready to run.
enum Write {
    Set(Path, Value),
    Push(Path, Value),
    Update(Path, BTreeMap<String, Value>),
    Remove(Path),
}

fn plan(request: MutateRequest) -> Result<Write, Error> {
    let MutateRequest { path, data, action } = request;

    let path = Path::parse(&path)?;
    if path.is_empty() {
        return Err(Error::invalid_request(format!(
            "{} needs a path below the root",
            action
        )));
    }

    let data = match (action.needs_data(), data) {
        (true, None) => {
            return Err(Error::invalid_request(format!("{} needs data", action)));
        }
        (_, data) => data.unwrap_or(Value::Null),
    };

    Ok(match action {
        Action::Create => Write::Set(path, data),
        Action::CreateWithId => Write::Push(path, data),
        Action::Update => match data {
            Value::Map(patch) => Write::Update(path, patch),
            _ => {
                return Err(Error::invalid_request(
                    "update data must be a map of fields",
                ))
            }
        },
        Action::Delete => Write::Remove(path),
    })
}

/// Run a write, returning the generated key for `CreateWithId`.
pub fn try_mutate(db: &dyn Database, request: MutateRequest) -> Result<Option<String>, Error> {
    match plan(request)? {
        Write::Set(path, value) => db.set(&path, value).map(|_| None),
        Write::Push(path, value) => db.push(&path, value).map(Some),
        Write::Update(path, patch) => db.update(&path, patch).map(|_| None),
        Write::Remove(path) => db.remove(&path).map(|_| None),
    }
}

/// Run a write and report the outcome. Never panics, never returns `Err`.
///
/// # Example
///
/// ```rust
/// use clinicdb_access::{mutate_data, MutateRequest};
/// use clinicdb_memory::MemoryDatabase;
///
/// let db = MemoryDatabase::new();
/// let result = mutate_data(&db, MutateRequest::create_with_id("expenses", 250i64));
/// assert!(result.success);
/// assert!(result.id.is_some());
/// ```
pub fn mutate_data(db: &dyn Database, request: MutateRequest) -> MutationResult {
    let action = request.action;
    let path = request.path.clone();
    let result = try_mutate(db, request);
    if let Err(e) = &result {
        log::warn!("{} at '{}' failed: {}", action, path, e);
    }
    result.into()
}

#[cfg(feature = "async")]
pub use self::non_blocking::{mutate_data_async, try_mutate_async};

#[cfg(feature = "async")]
mod non_blocking {
    use super::*;
    use clinicdb_core::AsyncDatabase;

    pub async fn try_mutate_async<D: AsyncDatabase + ?Sized>(
        db: &D,
        request: MutateRequest,
    ) -> Result<Option<String>, Error> {
        match plan(request)? {
            Write::Set(path, value) => db.set_async(&path, value).await.map(|_| None),
            Write::Push(path, value) => db.push_async(&path, value).await.map(Some),
            Write::Update(path, patch) => db.update_async(&path, patch).await.map(|_| None),
            Write::Remove(path) => db.remove_async(&path).await.map(|_| None),
        }
    }

    pub async fn mutate_data_async<D: AsyncDatabase + ?Sized>(
        db: &D,
        request: MutateRequest,
    ) -> MutationResult {
        let action = request.action;
        let path = request.path.clone();
        let result = try_mutate_async(db, request).await;
        if let Err(e) = &result {
            log::warn!("{} at '{}' failed: {}", action, path, e);
        }
        result.into()
    }
}
