//! Fetches and mutations against the in-memory store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use clinicdb_access::{
    fetch_collection, fetch_collection_filtered, fetch_one, mutate_data, use_fetch, Fetch,
    FetchOptions, FetchState, MutateRequest,
};
use clinicdb_core::{
    path, Database, Error, Listener, Path, Snapshot, SubscriptionId, Value, MAX_DEPTH,
};
use clinicdb_memory::MemoryDatabase;
use serde::Deserialize;
use serde_json::json;

/// Forwards to a `MemoryDatabase`, counting subscription traffic.
#[derive(Default)]
struct SpyDatabase {
    inner: MemoryDatabase,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
}

impl Database for SpyDatabase {
    fn get(&self, path: &Path) -> Result<Option<Value>, Error> {
        self.inner.get(path)
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), Error> {
        self.inner.set(path, value)
    }

    fn push(&self, path: &Path, value: Value) -> Result<String, Error> {
        self.inner.push(path, value)
    }

    fn update(&self, path: &Path, patch: BTreeMap<String, Value>) -> Result<(), Error> {
        self.inner.update(path, patch)
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        self.inner.remove(path)
    }

    fn subscribe(&self, path: &Path, listener: Listener) -> Result<SubscriptionId, Error> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribe(path, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.unsubscribe(id)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct Doctor {
    name: String,
    speciality: String,
}

fn seeded(seed: serde_json::Value) -> Arc<dyn Database> {
    Arc::new(MemoryDatabase::with_data(clinicdb_serde::json_to_value(seed)))
}

#[test]
fn default_options_flatten_map_in_key_order() {
    let db = seeded(json!({"doctors": {
        "k2": {"name": "Dr. Iyer", "speciality": "ENT"},
        "k1": {"name": "Dr. Rao", "speciality": "Cardiology"},
    }}));

    let fetch = use_fetch::<Vec<Doctor>>(db, "doctors", FetchOptions::default());
    let doctors = fetch.data().flatten().unwrap();
    assert_eq!(
        doctors,
        vec![
            Doctor {
                name: "Dr. Rao".into(),
                speciality: "Cardiology".into()
            },
            Doctor {
                name: "Dr. Iyer".into(),
                speciality: "ENT".into()
            },
        ]
    );
}

#[test]
fn filter_applies_only_in_array_mode() {
    let db = seeded(json!({"slots": {
        "s1": {"doctor": "d1", "taken": true},
        "s2": {"doctor": "d1", "taken": false},
    }}));
    let free = |v: &Value| v.get(&path!("taken")) == Some(&Value::from(false));

    let filtered = use_fetch::<Vec<serde_json::Value>>(
        db.clone(),
        "slots",
        FetchOptions::default().with_filter(free),
    );
    assert_eq!(
        filtered.data().flatten(),
        Some(vec![json!({"doctor": "d1", "taken": false})])
    );

    let raw = use_fetch::<serde_json::Value>(
        db,
        "slots",
        FetchOptions::raw().with_filter(free),
    );
    let all = raw.data().flatten().unwrap();
    assert_eq!(all.as_object().unwrap().len(), 2);
}

#[test]
fn create_then_raw_fetch_reads_it_back() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let record = Value::from_iter([("name", "Asha"), ("blood", "O+")]);

    let result = mutate_data(db.as_ref(), MutateRequest::create("patients/p1", record.clone()));
    assert!(result.success);

    let fetch: Fetch<Option<Value>> = fetch_one(db, "patients/p1");
    assert_eq!(fetch.data(), Some(Some(record)));
}

#[test]
fn delete_twice_succeeds() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    mutate_data(db.as_ref(), MutateRequest::create("labs/l1", "Central"));

    assert!(mutate_data(db.as_ref(), MutateRequest::delete("labs/l1")).success);
    assert!(mutate_data(db.as_ref(), MutateRequest::delete("labs/l1")).success);

    let fetch = use_fetch::<Value>(db, "labs/l1", FetchOptions::raw());
    assert_eq!(fetch.state(), FetchState::Ready(None));
}

#[test]
fn create_with_id_keys_are_unique() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let ids: Vec<String> = (0..50)
        .map(|i| {
            mutate_data(db.as_ref(), MutateRequest::create_with_id("expenses", i as i64))
                .id
                .unwrap()
        })
        .collect();

    assert!(ids.iter().all(|id| !id.is_empty()));
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    // Keys sort in creation order, so the collection reads back in order.
    let expenses = fetch_collection::<i64>(db, "expenses");
    assert_eq!(expenses.data().unwrap(), (0..50).collect::<Vec<i64>>());
}

#[test]
fn update_is_a_shallow_merge() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    mutate_data(
        db.as_ref(),
        MutateRequest::create("record", Value::from_iter([("a", 0i64), ("b", 2i64)])),
    );

    let result = mutate_data(
        db.as_ref(),
        MutateRequest::update("record", Value::from_iter([("a", 1i64)])),
    );
    assert!(result.success);
    assert_eq!(
        db.get(&path!("record")).unwrap(),
        Some(Value::from_iter([("a", 1i64), ("b", 2i64)]))
    );
}

#[test]
fn update_below_max_depth_is_refused() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let base = vec!["a"; MAX_DEPTH - 1].join("/");

    let result = mutate_data(
        db.as_ref(),
        MutateRequest::update(base.as_str(), Value::from_iter([("x/y/z", 1i64)])),
    );
    assert!(!result.success);
    assert!(result.error.unwrap().contains("levels deep"));
    assert_eq!(db.get(&Path::parse(&base).unwrap()).unwrap(), None);
}

#[test]
fn empty_path_never_subscribes() {
    let spy = Arc::new(SpyDatabase::default());
    let mut fetch = use_fetch::<Value>(spy.clone(), "", FetchOptions::default());

    assert_eq!(fetch.state(), FetchState::Idle);
    assert_eq!(fetch.snapshot(), (None, false));

    fetch.refetch();
    drop(fetch);
    assert_eq!(spy.subscribes.load(Ordering::SeqCst), 0);
    assert_eq!(spy.unsubscribes.load(Ordering::SeqCst), 0);
}

#[test]
fn drop_unsubscribes_and_stops_updates() {
    let spy = Arc::new(SpyDatabase::default());
    let fetch = fetch_collection::<String>(spy.clone(), "labs");
    let mut rx = fetch.watch();
    assert_eq!(spy.inner.listener_count(), 1);

    drop(fetch);
    assert_eq!(spy.unsubscribes.load(Ordering::SeqCst), 1);
    assert_eq!(spy.inner.listener_count(), 0);

    rx.borrow_and_update();
    spy.set(&path!("labs/l1"), Value::from("Central")).unwrap();
    assert!(!rx.has_changed().unwrap_or(false));
}

#[test]
fn live_updates_follow_writes() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let fetch = fetch_collection_filtered::<String>(db.clone(), "patients", |v| {
        v.as_str().is_some_and(|name| name.starts_with('A'))
    });
    assert_eq!(fetch.data(), Some(vec![]));

    db.set(&path!("patients/p1"), Value::from("Asha")).unwrap();
    db.set(&path!("patients/p2"), Value::from("Ravi")).unwrap();
    db.set(&path!("patients/p3"), Value::from("Anil")).unwrap();
    assert_eq!(
        fetch.data(),
        Some(vec!["Asha".to_string(), "Anil".to_string()])
    );

    db.remove(&path!("patients")).unwrap();
    assert_eq!(fetch.data(), Some(vec![]));
}

#[test]
fn concurrent_writers_leave_fetch_on_latest_value() {
    let db = Arc::new(MemoryDatabase::new());
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);

    // A slow listener that holds up delivery of the first write.
    db.subscribe(
        &path!("slots/s1"),
        Arc::new(move |event: Result<Snapshot, Error>| {
            if event.ok().and_then(Snapshot::into_value) == Some(Value::from(1i64)) {
                entered_tx.lock().unwrap().send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
            }
        }),
    )
    .unwrap();
    let fetch = fetch_one::<i64>(db.clone(), "slots/s1");

    let writer = db.clone();
    let first = thread::spawn(move || {
        writer.set(&path!("slots/s1"), Value::from(1i64)).unwrap();
    });
    entered_rx.recv().unwrap();
    db.set(&path!("slots/s1"), Value::from(2i64)).unwrap();
    release_tx.send(()).unwrap();
    first.join().unwrap();

    assert_eq!(db.get(&path!("slots/s1")).unwrap(), Some(Value::from(2i64)));
    assert_eq!(fetch.state(), FetchState::Ready(Some(2)));
}

#[test]
fn set_path_follows_the_new_record() {
    let db = seeded(json!({"doctors": {
        "d1": {"name": "Dr. Rao", "speciality": "Cardiology"},
        "d2": {"name": "Dr. Iyer", "speciality": "ENT"},
    }}));
    let mut fetch = fetch_one::<Doctor>(db.clone(), "doctors/d1");
    assert_eq!(fetch.data().flatten().unwrap().name, "Dr. Rao");

    fetch.set_path("doctors/d2");
    assert_eq!(fetch.data().flatten().unwrap().name, "Dr. Iyer");

    db.remove(&path!("doctors/d1")).unwrap();
    assert_eq!(fetch.data().flatten().unwrap().name, "Dr. Iyer");
}

#[test]
fn denied_subscription_fails() {
    use clinicdb_memory::Rules;

    let spy = Arc::new(SpyDatabase {
        inner: MemoryDatabase::new().with_rules(Rules::allow_all().deny_read(path!("admin"))),
        ..SpyDatabase::default()
    });
    let fetch = fetch_one::<Value>(spy.clone(), "admin/keys");
    assert_eq!(
        fetch.state().error(),
        Some("permission denied: read at '/admin/keys'")
    );
    assert_eq!(spy.inner.listener_count(), 0);

    // The refused subscription holds nothing, so dropping releases nothing.
    drop(fetch);
    assert_eq!(spy.subscribes.load(Ordering::SeqCst), 1);
    assert_eq!(spy.unsubscribes.load(Ordering::SeqCst), 0);
}

#[test]
fn scalar_in_collection_mode_fails() {
    let db = seeded(json!({"settings": {"open": true}}));
    let fetch = fetch_collection::<bool>(db, "settings/open");
    assert!(fetch.state().error().is_some());
}

#[test]
fn listeners_see_snapshot_paths() {
    let db = MemoryDatabase::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    db.subscribe(
        &path!("attendance/u1"),
        Arc::new(move |event: Result<Snapshot, Error>| {
            if let Ok(snapshot) = event {
                sink.lock().unwrap().push(snapshot.key().map(str::to_string));
            }
        }),
    )
    .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string())]);
}

#[tokio::test]
async fn watch_receives_changes() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let fetch = fetch_one::<String>(db.clone(), "ambulanceBookings/b1/status");
    let mut rx = fetch.watch();

    let writer = db.clone();
    tokio::spawn(async move {
        writer
            .set(&path!("ambulanceBookings/b1/status"), Value::from("dispatched"))
            .unwrap();
    });

    tokio::time::timeout(std::time::Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        *rx.borrow(),
        FetchState::Ready(Some("dispatched".to_string()))
    );
}
