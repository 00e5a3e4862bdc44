// Test doubles shared by the reconciliation test suites.
#![allow(dead_code)]

use async_trait::async_trait;
use edit_reconciler::{
    Entity, EntityId, EntityStore, FieldBinding, InMemoryEntityStore, PersistenceGateway,
    ReconcileError, Result, Value,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Gateway that records every update attempt and can reject chosen ids.
#[derive(Default)]
pub struct RecordingGateway {
    attempts: Mutex<Vec<(EntityId, Entity)>>,
    rejected: Mutex<HashSet<EntityId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject(&self, id: impl Into<EntityId>) {
        self.rejected.lock().unwrap().insert(id.into());
    }

    pub fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
    }

    pub fn attempts(&self) -> Vec<(EntityId, Entity)> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempted_ids(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn update(&self, id: &EntityId, entity: Entity) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.attempts.lock().unwrap().push((id.clone(), entity));
        if self.rejected.lock().unwrap().contains(id) {
            return Err(ReconcileError::persistence(id, "gateway rejected update"));
        }
        Ok(())
    }
}

/// Store that parks the first lookup until released, to interleave edits
/// with an in-flight commit.
pub struct GatedStore {
    inner: InMemoryEntityStore,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryEntityStore::from_entities(entities),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl EntityStore for GatedStore {
    async fn get_by_id(&self, id: &EntityId) -> Result<Option<Entity>> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.get_by_id(id).await
    }
}

/// Store whose lookups always fail
pub struct UnavailableStore;

#[async_trait]
impl EntityStore for UnavailableStore {
    async fn get_by_id(&self, _id: &EntityId) -> Result<Option<Entity>> {
        Err(ReconcileError::StoreUnavailable("connection refused".into()))
    }
}

pub type RevertLog = Arc<Mutex<Vec<(&'static str, EntityId, String, Value)>>>;

/// Form control double: logs each revert under its own name
pub struct RecordingBinding {
    name: &'static str,
    log: RevertLog,
    fail: bool,
}

impl RecordingBinding {
    pub fn new(name: &'static str, log: &RevertLog) -> Arc<dyn FieldBinding> {
        Arc::new(Self {
            name,
            log: log.clone(),
            fail: false,
        })
    }

    pub fn failing(name: &'static str, log: &RevertLog) -> Arc<dyn FieldBinding> {
        Arc::new(Self {
            name,
            log: log.clone(),
            fail: true,
        })
    }
}

impl FieldBinding for RecordingBinding {
    fn revert_field(&self, entity_id: &EntityId, field: &str, value: &Value) -> Result<()> {
        if self.fail {
            return Err(ReconcileError::Config(format!("{} is read-only", self.name)));
        }
        self.log
            .lock()
            .unwrap()
            .push((self.name, entity_id.clone(), field.to_string(), value.clone()));
        Ok(())
    }
}

pub fn revert_log() -> RevertLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Three job applications used across the suites
pub fn applications() -> Vec<Entity> {
    vec![
        Entity::new(1i64)
            .with_field("company", "OldCo")
            .with_field("position", "Intern")
            .with_field("stage", "Applied"),
        Entity::new(2i64)
            .with_field("company", "Initech")
            .with_field("position", "Intern")
            .with_field("stage", "Applied"),
        Entity::new(4i64)
            .with_field("company", "Globex")
            .with_field("stage", "Interview"),
    ]
}

pub fn seeded_store() -> Arc<InMemoryEntityStore> {
    Arc::new(InMemoryEntityStore::from_entities(applications()))
}
