use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge::{port_pair, CorePorts, DiagnosticSink, StorageBridge, StorageCommand, StorageResponse};
use store::{KvStore, MemoryStore, StoreError};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Sink that records every reported store failure.
#[derive(Default)]
struct CollectingSink {
    reports: Mutex<Vec<(&'static str, Option<String>, String)>>,
}

impl CollectingSink {
    fn reports(&self) -> Vec<(&'static str, Option<String>, String)> {
        self.reports.lock().expect("sink lock").clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn store_error(&self, op: &'static str, key: Option<&str>, err: &StoreError) {
        self.reports
            .lock()
            .expect("sink lock")
            .push((op, key.map(str::to_string), err.to_string()));
    }
}

async fn spawn_bridge(
    store: Arc<dyn KvStore>,
    scope: Option<String>,
) -> (CorePorts, Arc<CollectingSink>, JoinHandle<()>) {
    let sink = Arc::new(CollectingSink::default());
    let bridge = StorageBridge::new(store, sink.clone(), scope);
    let (core, handle) = port_pair(16);
    let task = bridge.register(handle).await.expect("register bridge");
    (core, sink, task)
}

async fn get(core: &mut CorePorts, key: &str) -> StorageResponse {
    core.commands
        .send(StorageCommand::Get { key: key.to_string() })
        .await
        .expect("send get");
    timeout(Duration::from_secs(2), core.responses.recv())
        .await
        .expect("response within deadline")
        .expect("response port open")
}

async fn set(core: &CorePorts, key: &str, value: &str) {
    core.commands
        .send(StorageCommand::Set { key: key.to_string(), value: value.to_string() })
        .await
        .expect("send set");
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let (mut core, sink, _task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    set(&core, "theme", "dark").await;
    let resp = get(&mut core, "theme").await;

    assert_eq!(resp, StorageResponse::Value { key: "theme".into(), value: "dark".into() });
    assert!(sink.reports().is_empty());
}

#[tokio::test]
async fn get_of_missing_key_is_absent() {
    let (mut core, _sink, _task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    let resp = get(&mut core, "missing").await;
    assert_eq!(resp, StorageResponse::Absent { key: "missing".into() });
}

#[tokio::test]
async fn remove_then_get_is_absent_either_way() {
    let (mut core, _sink, _task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    // key that existed
    set(&core, "a", "1").await;
    core.commands
        .send(StorageCommand::Remove { key: "a".into() })
        .await
        .expect("send remove");
    assert_eq!(get(&mut core, "a").await, StorageResponse::Absent { key: "a".into() });

    // key that never existed: remove is a silent no-op
    core.commands
        .send(StorageCommand::Remove { key: "ghost".into() })
        .await
        .expect("send remove");
    assert_eq!(get(&mut core, "ghost").await, StorageResponse::Absent { key: "ghost".into() });
}

#[tokio::test]
async fn clear_wipes_every_key_when_unscoped() {
    let (mut core, _sink, _task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    set(&core, "a", "1").await;
    set(&core, "b", "2").await;
    core.commands.send(StorageCommand::Clear).await.expect("send clear");

    assert_eq!(get(&mut core, "a").await, StorageResponse::Absent { key: "a".into() });
    assert_eq!(get(&mut core, "b").await, StorageResponse::Absent { key: "b".into() });
}

#[tokio::test]
async fn scoped_clear_spares_foreign_keys() {
    let (mut core, _sink, _task) =
        spawn_bridge(Arc::new(MemoryStore::new()), Some("app:".to_string())).await;

    set(&core, "app:theme", "dark").await;
    set(&core, "other:counter", "7").await;
    core.commands.send(StorageCommand::Clear).await.expect("send clear");

    assert_eq!(
        get(&mut core, "app:theme").await,
        StorageResponse::Absent { key: "app:theme".into() }
    );
    assert_eq!(
        get(&mut core, "other:counter").await,
        StorageResponse::Value { key: "other:counter".into(), value: "7".into() }
    );
}

#[tokio::test]
async fn last_write_wins_in_emission_order() {
    let (mut core, _sink, _task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    set(&core, "k", "a").await;
    set(&core, "k", "b").await;
    let resp = get(&mut core, "k").await;

    assert_eq!(resp, StorageResponse::Value { key: "k".into(), value: "b".into() });
}

#[tokio::test]
async fn quota_failure_is_reported_and_bridge_keeps_going() {
    // room for one small entry only
    let (mut core, sink, _task) =
        spawn_bridge(Arc::new(MemoryStore::with_capacity(16)), None).await;

    set(&core, "big", &"x".repeat(64)).await;
    // a later command proves the subscription survived the failure
    set(&core, "small", "ok").await;
    let resp = get(&mut core, "small").await;

    assert_eq!(resp, StorageResponse::Value { key: "small".into(), value: "ok".into() });
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "set");
    assert_eq!(reports[0].1.as_deref(), Some("big"));
    assert!(reports[0].2.contains("quota"));
    assert_eq!(get(&mut core, "big").await, StorageResponse::Absent { key: "big".into() });
}

/// Store whose reads always fail; writes succeed into a real map.
struct FlakyReads {
    inner: MemoryStore,
}

#[async_trait]
impl KvStore for FlakyReads {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Io("read failed".into()))
    }
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }
    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.remove(key).await
    }
    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys().await
    }
}

#[tokio::test]
async fn failed_get_reads_as_absent() {
    let store = Arc::new(FlakyReads { inner: MemoryStore::new() });
    let (mut core, sink, _task) = spawn_bridge(store, None).await;

    set(&core, "k", "v").await;
    let resp = get(&mut core, "k").await;

    // the core cannot tell a failed read from a miss
    assert_eq!(resp, StorageResponse::Absent { key: "k".into() });
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "get");
}

#[tokio::test]
async fn relay_finishes_when_core_hangs_up() {
    let (core, _sink, task) = spawn_bridge(Arc::new(MemoryStore::new()), None).await;

    set(&core, "k", "v").await;
    drop(core);

    timeout(Duration::from_secs(2), task)
        .await
        .expect("relay stops after command port closes")
        .expect("relay task exits cleanly");
}
