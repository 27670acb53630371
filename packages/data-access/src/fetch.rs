//! Live reads: subscribe to a path and keep a derived state current.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use clinicdb_core::{Database, Error, Listener, Path, Snapshot, SubscriptionId, Value};
use clinicdb_serde::from_value;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

/// Predicate applied to each element of a collection.
pub type Filter = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Turns the raw value at the subscribed path into the exposed data.
type Project<T> = Arc<dyn Fn(Option<Value>) -> Result<T, Error> + Send + Sync>;

/// How `use_fetch` shapes what it reads.
///
/// By default a keyed collection is flattened into its values, in key order,
/// and `filter` is applied to each. With `need_raw` the value is exposed as
/// stored and `filter` is ignored.
#[derive(Clone, Default)]
pub struct FetchOptions {
    pub need_raw: bool,
    pub filter: Option<Filter>,
}

impl FetchOptions {
    /// Expose the value as stored.
    pub fn raw() -> Self {
        Self {
            need_raw: true,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("need_raw", &self.need_raw)
            .field("filter", &self.filter.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Where a `Fetch` stands.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchState<T> {
    /// No path: nothing is subscribed and nothing will arrive.
    Idle,
    /// Subscribed, waiting for the first snapshot.
    Loading,
    Ready(T),
    /// The path was malformed, the subscription was refused, or the data
    /// could not be shaped.
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FetchState::Ready(_))
    }

    pub fn data_ref(&self) -> Option<&T> {
        match self {
            FetchState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T: Clone> FetchState<T> {
    /// The data, if any has arrived.
    pub fn data(&self) -> Option<T> {
        self.data_ref().cloned()
    }
}

struct Inner<T> {
    /// Bumped on every (re)subscription and on release. Events tagged with
    /// an older generation are dropped.
    generation: Mutex<u64>,
    tx: watch::Sender<FetchState<T>>,
    project: Project<T>,
}

impl<T> Inner<T> {
    fn generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new generation and publish `state` for it.
    fn advance(&self, state: FetchState<T>) -> u64 {
        let mut generation = self.generation();
        *generation += 1;
        self.tx.send_replace(state);
        *generation
    }

    fn deliver(&self, tag: u64, event: Result<Snapshot, Error>) {
        let generation = self.generation();
        if *generation != tag {
            log::debug!("Dropping event from released subscription");
            return;
        }
        let state = match event.and_then(|snapshot| (self.project)(snapshot.into_value())) {
            Ok(data) => FetchState::Ready(data),
            Err(e) => FetchState::Failed(e.to_string()),
        };
        self.tx.send_replace(state);
    }
}

/// A live read of one path.
///
/// Holds at most one subscription. The state is re-derived from every
/// snapshot the store delivers. Dropping the `Fetch` releases the
/// subscription.
///
/// # Example
///
/// ```rust,ignore
/// let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
/// let doctors = fetch_collection::<Doctor>(db.clone(), "doctors");
///
/// match doctors.state() {
///     FetchState::Ready(list) => render(list),
///     FetchState::Loading => spinner(),
///     _ => {}
/// }
/// ```
pub struct Fetch<T> {
    db: Arc<dyn Database>,
    path: String,
    subscription: Option<SubscriptionId>,
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Fetch<T> {
    /// Subscribe to `path`, shaping each value with `project`.
    ///
    /// An empty `path` subscribes to nothing and stays `Idle`.
    pub fn new(
        db: Arc<dyn Database>,
        path: impl Into<String>,
        project: impl Fn(Option<Value>) -> Result<T, Error> + Send + Sync + 'static,
    ) -> Self {
        let (tx, _) = watch::channel(FetchState::Idle);
        let mut fetch = Self {
            db,
            path: path.into(),
            subscription: None,
            inner: Arc::new(Inner {
                generation: Mutex::new(0),
                tx,
                project: Arc::new(project),
            }),
        };
        fetch.start();
        fetch
    }

    /// A copy of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.inner.tx.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner.tx.borrow().data()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.tx.borrow().is_loading()
    }

    /// The `(data, is_loading)` pair.
    pub fn snapshot(&self) -> (Option<T>, bool) {
        let state = self.inner.tx.borrow();
        (state.data(), state.is_loading())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Receive every state change.
    pub fn watch(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.tx.subscribe()
    }

    /// Drop the current subscription and subscribe again.
    ///
    /// Does nothing when there is no path.
    pub fn refetch(&mut self) {
        if self.path.is_empty() {
            return;
        }
        log::debug!("Refetching /{}...", self.path);
        self.release();
        self.start();
    }

    /// Point this fetch at another path. The same path keeps the current
    /// subscription.
    pub fn set_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path == self.path {
            return;
        }
        self.release();
        self.path = path;
        self.start();
    }

    fn start(&mut self) {
        if self.path.is_empty() {
            self.inner.advance(FetchState::Idle);
            return;
        }

        let path = match Path::parse(&self.path) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Not subscribing to '{}': {}", self.path, e);
                self.inner.advance(FetchState::Failed(Error::from(e).to_string()));
                return;
            }
        };

        let tag = self.inner.advance(FetchState::Loading);
        let inner = self.inner.clone();
        let listener: Listener =
            Arc::new(move |event: Result<Snapshot, Error>| inner.deliver(tag, event));

        match self.db.subscribe(&path, listener) {
            Ok(id) => self.subscription = Some(id),
            Err(e) => {
                log::warn!("Subscribing to /{} failed: {}", path, e);
                self.inner.deliver(tag, Err(e));
            }
        }
    }
}

impl<T> Fetch<T> {
    fn release(&mut self) {
        {
            let mut generation = self.inner.generation();
            *generation += 1;
        }
        if let Some(id) = self.subscription.take() {
            self.db.unsubscribe(id);
        }
    }
}

impl<T> Drop for Fetch<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Fetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetch")
            .field("path", &self.path)
            .field("subscription", &self.subscription)
            .field("state", &*self.inner.tx.borrow())
            .finish()
    }
}

/// Flatten a collection into its elements.
///
/// A map yields its values in key order, an array its non-null elements,
/// nothing yields an empty list. A scalar is not a collection.
pub fn collect_values(value: Option<Value>, filter: Option<&Filter>) -> Result<Vec<Value>, Error> {
    let values: Vec<Value> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Map(map)) => map.into_values().collect(),
        Some(Value::Array(arr)) => arr.into_iter().filter(|v| !v.is_null()).collect(),
        Some(other) => {
            return Err(Error::decode(format!(
                "expected a collection, found {}",
                describe(&other)
            )))
        }
    };
    Ok(match filter {
        Some(filter) => values.into_iter().filter(|v| filter(v)).collect(),
        None => values,
    })
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Integer(_) | Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
    }
}

/// Live read of a single record, as stored.
pub fn fetch_one<R>(db: Arc<dyn Database>, path: impl Into<String>) -> Fetch<Option<R>>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    Fetch::new(db, path, |value| value.map(from_value::<R>).transpose())
}

/// Live read of a collection as a list of records.
pub fn fetch_collection<R>(db: Arc<dyn Database>, path: impl Into<String>) -> Fetch<Vec<R>>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    Fetch::new(db, path, |value| {
        collect_values(value, None)?
            .into_iter()
            .map(from_value::<R>)
            .collect()
    })
}

/// Live read of the collection elements that pass `filter`.
pub fn fetch_collection_filtered<R>(
    db: Arc<dyn Database>,
    path: impl Into<String>,
    filter: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> Fetch<Vec<R>>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let filter: Filter = Arc::new(filter);
    Fetch::new(db, path, move |value| {
        collect_values(value, Some(&filter))?
            .into_iter()
            .map(from_value::<R>)
            .collect()
    })
}

/// Live read shaped by `options`.
///
/// In raw mode the stored value is deserialized into `T`; nothing stored is
/// `None`. Otherwise the (filtered) elements are deserialized into `T` as a
/// list, so `T` is usually a `Vec` and an absent collection is an empty one.
pub fn use_fetch<T>(
    db: Arc<dyn Database>,
    path: impl Into<String>,
    options: FetchOptions,
) -> Fetch<Option<T>>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let FetchOptions { need_raw, filter } = options;
    Fetch::new(db, path, move |value| {
        if need_raw {
            return value.map(from_value::<T>).transpose();
        }
        let values = collect_values(value, filter.as_ref())?;
        from_value(Value::Array(values)).map(Some)
    })
}
