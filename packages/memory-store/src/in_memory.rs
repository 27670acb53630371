//! In-memory realtime store.
//!
//! Stands in for the hosted realtime database: one `Value` tree, live
//! listeners, generated push keys and prefix access rules.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use clinicdb_core::{
    Database, Error, Listener, Operation, Path, Snapshot, SubscriptionId, Value,
};
use clinicdb_serde::json_to_value;

use crate::config::{ConfigError, StoreConfig};
use crate::push_id::PushIdGenerator;
use crate::rules::Rules;
use crate::value_utils;

/// A listener event waiting for delivery. `None` targets a listener that
/// was never registered, such as a refused subscription.
struct Queued {
    target: Option<SubscriptionId>,
    listener: Listener,
    event: Result<Snapshot, Error>,
}

struct Registration {
    path: Path,
    listener: Listener,
    /// Last value queued, to suppress events for unchanged values.
    last: Option<Value>,
}

struct State {
    root: Value,
    listeners: BTreeMap<SubscriptionId, Registration>,
    next_subscription: u64,
    push_ids: PushIdGenerator,
    /// Events in commit order.
    queue: VecDeque<Queued>,
    /// Set while some thread is delivering the queue.
    draining: bool,
}

impl State {
    /// Queue an event for every listener related to any of `touched` whose
    /// value changed.
    fn collect_changes(&mut self, touched: &[Path]) {
        for (id, registration) in self.listeners.iter_mut() {
            if !touched.iter().any(|p| p.is_related(&registration.path)) {
                continue;
            }
            let current = value_utils::read(&self.root, &registration.path);
            if current != registration.last {
                registration.last = current.clone();
                self.queue.push_back(Queued {
                    target: Some(*id),
                    listener: registration.listener.clone(),
                    event: Ok(Snapshot::new(registration.path.clone(), current)),
                });
            }
        }
    }

    /// Next event still addressed to a live listener.
    fn next_event(&mut self) -> Option<Queued> {
        while let Some(queued) = self.queue.pop_front() {
            match queued.target {
                Some(id) if !self.listeners.contains_key(&id) => continue,
                _ => return Some(queued),
            }
        }
        None
    }
}

/// Clears the draining flag if a listener panics mid-delivery.
struct DrainGuard<'a> {
    state: &'a Mutex<State>,
    armed: bool,
}

impl DrainGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.draining = false;
        }
    }
}

/// An in-memory store implementing the realtime `Database` contract.
///
/// Listener callbacks run without the store lock held, so a callback may
/// read from or write to the store. Events are queued in commit order and
/// delivered by one thread at a time: the writer that finds the queue idle
/// delivers everything queued until it is empty, including events from
/// writes made by other threads or by the callbacks themselves.
///
/// # Example
///
/// ```rust
/// use clinicdb_core::{Database, Value, path};
/// use clinicdb_memory::MemoryDatabase;
///
/// let db = MemoryDatabase::new();
/// let key = db.push(&path!("patients"), Value::from("Asha")).unwrap();
///
/// let at = path!("patients").child(&key).unwrap();
/// assert_eq!(db.get(&at).unwrap(), Some(Value::from("Asha")));
/// ```
pub struct MemoryDatabase {
    state: Mutex<State>,
    rules: Rules,
}

impl MemoryDatabase {
    /// Create a new empty store with no access rules.
    pub fn new() -> Self {
        Self::with_data(Value::Null)
    }

    /// Create a store with initial data.
    pub fn with_data(root: Value) -> Self {
        Self {
            state: Mutex::new(State {
                root: root.normalized().unwrap_or(Value::Null),
                listeners: BTreeMap::new(),
                next_subscription: 0,
                push_ids: PushIdGenerator::new(),
                queue: VecDeque::new(),
                draining: false,
            }),
            rules: Rules::allow_all(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        let rules = Rules::compile(&config.rules)?;
        let root = config
            .seed
            .clone()
            .map(json_to_value)
            .unwrap_or(Value::Null);
        if !root.is_null() && !root.is_map() {
            return Err(ConfigError::Seed(Error::InvalidData {
                path: Path::root(),
                message: "seed data must be a JSON object".to_string(),
            }));
        }
        Ok(Self::with_data(root).with_rules(rules))
    }

    /// A copy of the whole tree.
    pub fn export(&self) -> Result<Value, Error> {
        Ok(self.lock()?.root.clone())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().map(|s| s.listeners.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        self.state.lock().map_err(|_| Error::Other {
            message: "lock poisoned".into(),
        })
    }

    /// Run a write under the lock, then notify affected listeners.
    ///
    /// `apply` returns its result and the paths it wrote.
    fn commit<R>(
        &self,
        apply: impl FnOnce(&mut State) -> Result<(R, Vec<Path>), Error>,
    ) -> Result<R, Error> {
        let result = {
            let mut state = self.lock()?;
            let (result, touched) = apply(&mut state)?;
            state.collect_changes(&touched);
            result
        };
        self.drain();
        Ok(result)
    }

    /// Deliver queued events unless another thread already is.
    fn drain(&self) {
        {
            let Ok(mut state) = self.lock() else { return };
            if state.draining || state.queue.is_empty() {
                return;
            }
            log::debug!("Notifying {} listener(s)...", state.queue.len());
            state.draining = true;
        }
        let mut guard = DrainGuard {
            state: &self.state,
            armed: true,
        };
        loop {
            let next = {
                let mut state = match self.state.lock() {
                    Ok(state) => state,
                    Err(_) => return,
                };
                match state.next_event() {
                    Some(queued) => queued,
                    None => {
                        // Cleared under the lock that saw the queue empty.
                        state.draining = false;
                        guard.disarm();
                        return;
                    }
                }
            };
            (next.listener)(next.event);
        }
    }

    fn check(&self, path: &Path, operation: Operation) -> Result<(), Error> {
        self.rules.check(path, operation).map_err(|e| {
            log::warn!("{}", e);
            e
        })
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Database for MemoryDatabase {
    fn get(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.check(path, Operation::Read)?;
        Ok(value_utils::read(&self.lock()?.root, path))
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.check(path, Operation::Write)?;
        log::debug!("Setting /{}...", path);
        self.commit(|state| {
            value_utils::write(&mut state.root, path, value)?;
            Ok(((), vec![path.clone()]))
        })
    }

    fn push(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.check(path, Operation::Write)?;
        self.commit(|state| {
            let key = state.push_ids.next_id();
            let at = path.child(&key)?;
            log::debug!("Pushing /{}...", at);
            value_utils::write(&mut state.root, &at, value)?;
            Ok((key, vec![at]))
        })
    }

    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error> {
        let entries = value_utils::resolve_patch(path, patch)?;
        for (at, _) in &entries {
            self.check(at, Operation::Write)?;
        }
        log::debug!("Updating {} key(s) under /{}...", entries.len(), path);
        self.commit(|state| {
            let touched = entries.iter().map(|(at, _)| at.clone()).collect();
            value_utils::merge(&mut state.root, entries)?;
            Ok(((), touched))
        })
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        self.check(path, Operation::Write)?;
        log::debug!("Removing /{}...", path);
        self.commit(|state| {
            value_utils::delete(&mut state.root, path);
            Ok(((), vec![path.clone()]))
        })
    }

    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error> {
        let registered = {
            let mut state = self.lock()?;
            match self.check(path, Operation::Read) {
                Ok(()) => {
                    state.next_subscription += 1;
                    let id = SubscriptionId::new(state.next_subscription);
                    let current = value_utils::read(&state.root, path);
                    state.listeners.insert(
                        id,
                        Registration {
                            path: path.clone(),
                            listener: listener.clone(),
                            last: current.clone(),
                        },
                    );
                    state.queue.push_back(Queued {
                        target: Some(id),
                        listener,
                        event: Ok(Snapshot::new(path.clone(), current)),
                    });
                    log::debug!("Subscribed {} to /{}", id, path);
                    Ok(id)
                }
                // Cancelled right away: the listener gets the error and
                // nothing is registered.
                Err(e) => {
                    state.queue.push_back(Queued {
                        target: None,
                        listener,
                        event: Err(e.clone()),
                    });
                    Err(e)
                }
            }
        };
        self.drain();
        registered
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = match self.lock() {
            Ok(mut state) => state.listeners.remove(&id).is_some(),
            Err(_) => false,
        };
        if removed {
            log::debug!("Unsubscribed {}", id);
        }
        removed
    }
}
