// ============================================================================
// Reconciliation Engine
// ============================================================================
//
// Owns the change tracker and resolves it on command:
// - commit: group pending edits per entity, merge them into the store's
//   current snapshot and issue exactly one gateway update per entity,
//   sequentially, in first-seen order.
// - discard: tell every originating binding to show the pre-edit value.
//
// The tracker lock is never held across an `.await`. Between the snapshot at
// the start of `commit()` and the drain at its end, other callers may track
// or discard; `DrainMode` decides what the drain erases.
//
// ============================================================================

use super::dates::normalize_timestamp;
use super::report::{CommitReport, DiscardReport, EntityFailure};
use crate::config::{CommitFailurePolicy, DrainMode, EngineConfig};
use crate::core::{EntityId, ReconcileError, Result, Value};
use crate::interface::{EntityStore, FieldBinding, PersistenceGateway};
use crate::notification::{NotificationPhase, NotificationState};
use crate::tracking::{ChangeRecord, ChangeTracker};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{Instrument, Level, event, info_span};

/// Pending field values of one entity, last writer per field
type FieldEdits = IndexMap<String, Value>;

pub struct ReconciliationEngine<S, G> {
    store: S,
    gateway: G,
    config: EngineConfig,
    tracker: Mutex<ChangeTracker>,
    notification: NotificationState,
}

impl<S, G> ReconciliationEngine<S, G>
where
    S: EntityStore,
    G: PersistenceGateway,
{
    pub fn new(store: S, gateway: G, config: EngineConfig) -> Self {
        Self {
            store,
            gateway,
            config,
            tracker: Mutex::new(ChangeTracker::new()),
            notification: NotificationState::new(),
        }
    }

    // A panic while holding the lock cannot leave a half-written record
    // behind, so the tracker stays usable.
    fn tracker(&self) -> MutexGuard<'_, ChangeTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an edit made through `binding`.
    ///
    /// Only a weak reference to the binding is kept.
    pub fn track_change(
        &self,
        entity_id: impl Into<EntityId>,
        field: impl Into<String>,
        new_value: impl Into<Value>,
        original_value: impl Into<Value>,
        binding: &Arc<dyn FieldBinding>,
    ) {
        let entity_id = entity_id.into();
        let field = field.into();

        let mut tracker = self.tracker();
        let inserted = tracker.track(
            entity_id.clone(),
            field.clone(),
            new_value.into(),
            original_value.into(),
            Arc::downgrade(binding),
        );
        self.notification.set(true);
        drop(tracker);

        event!(
            Level::DEBUG,
            entity_id = %entity_id,
            field = %field,
            inserted,
            "change tracked"
        );
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.tracker().is_empty()
    }

    pub fn show_notification(&self) -> bool {
        self.notification.is_pending()
    }

    pub fn notification_phase(&self) -> NotificationPhase {
        self.notification.phase()
    }

    /// Watch channel flipping between `false` (quiescent) and `true` (pending)
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.notification.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.tracker().len()
    }

    /// Copy of the pending records in first-tracked order
    pub fn pending_changes(&self) -> Vec<ChangeRecord> {
        self.tracker().snapshot()
    }

    /// Persist every pending edit, one gateway update per entity.
    ///
    /// Never fails as a whole: missing entities, unparseable dates and
    /// rejected updates are collected per entity in the report while the
    /// remaining entities proceed.
    pub async fn commit(&self) -> CommitReport {
        let snapshot = self.tracker().snapshot();
        let span = info_span!("reconcile.commit", records = snapshot.len());

        async move {
            let mut report = CommitReport::default();

            for (entity_id, fields) in group_by_entity(&snapshot) {
                let span = info_span!(
                    "reconcile.entity",
                    entity_id = %entity_id,
                    fields = fields.len()
                );
                match self.commit_entity(&entity_id, &fields).instrument(span).await {
                    Ok(()) => report.committed.push(entity_id),
                    Err(error) => {
                        event!(
                            Level::WARN,
                            entity_id = %entity_id,
                            error = %error,
                            "entity skipped during commit"
                        );
                        report.failures.push(EntityFailure { entity_id, error });
                    }
                }
            }

            self.drain_after_commit(&snapshot, &mut report);

            event!(
                Level::INFO,
                committed = report.committed.len(),
                failed = report.failures.len(),
                retained = report.retained,
                "commit finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn commit_entity(&self, entity_id: &EntityId, fields: &FieldEdits) -> Result<()> {
        let mut entity = self
            .store
            .get_by_id(entity_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(entity_id.clone()))?;

        for (field, value) in fields {
            let value = if self.config.is_date_field(field) {
                normalize_timestamp(field, value)?
            } else {
                value.clone()
            };
            entity.set(field.clone(), value);
        }

        self.gateway.update(entity_id, entity).await?;
        event!(Level::DEBUG, "entity persisted");
        Ok(())
    }

    fn drain_after_commit(&self, snapshot: &[ChangeRecord], report: &mut CommitReport) {
        let retained_ids: HashSet<&EntityId> = match self.config.failure_policy {
            CommitFailurePolicy::DiscardAll => HashSet::new(),
            CommitFailurePolicy::RetainFailed => report
                .failures
                .iter()
                .filter(|failure| failure.error.is_retryable())
                .map(|failure| &failure.entity_id)
                .collect(),
        };

        let mut tracker = self.tracker();
        match self.config.drain_mode {
            DrainMode::Unconditional => {
                tracker.retain(|record| retained_ids.contains(&record.entity_id));
            }
            DrainMode::Snapshot => {
                // Revisions are unique, so an unchanged revision means the
                // record is exactly what this commit read.
                let captured: HashSet<u64> = snapshot.iter().map(|r| r.revision).collect();
                tracker.retain(|record| {
                    retained_ids.contains(&record.entity_id) || !captured.contains(&record.revision)
                });
            }
        }

        report.retained = tracker.len();
        self.notification.set(!tracker.is_empty());
    }

    /// Revert every pending edit in its originating UI element and forget it.
    ///
    /// Each tracked `(entity, field)` gets exactly one `revert_field` call
    /// carrying the value captured at its first edit. Bindings run after the
    /// tracker lock is released, so they may track new changes.
    pub fn discard(&self) -> DiscardReport {
        let records = self.tracker().drain();
        let mut report = DiscardReport::default();

        for record in records {
            let Some(binding) = record.binding() else {
                event!(
                    Level::DEBUG,
                    entity_id = %record.entity_id,
                    field = %record.field,
                    "binding dropped before revert"
                );
                report.detached.push(record.key());
                continue;
            };

            match binding.revert_field(&record.entity_id, &record.field, &record.original_value) {
                Ok(()) => report.reverted += 1,
                Err(err) => {
                    event!(
                        Level::WARN,
                        entity_id = %record.entity_id,
                        field = %record.field,
                        error = %err,
                        "binding failed to revert field"
                    );
                    report.failures.push(ReconcileError::BindingFailure {
                        entity_id: record.entity_id.clone(),
                        field: record.field.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let tracker = self.tracker();
        self.notification.set(!tracker.is_empty());
        drop(tracker);

        event!(
            Level::INFO,
            reverted = report.reverted,
            detached = report.detached.len(),
            failed = report.failures.len(),
            "discard finished"
        );
        report
    }
}

/// Group records by entity in first-seen order.
pub(crate) fn group_by_entity(records: &[ChangeRecord]) -> IndexMap<EntityId, FieldEdits> {
    let mut groups: IndexMap<EntityId, FieldEdits> = IndexMap::new();
    for record in records {
        groups
            .entry(record.entity_id.clone())
            .or_default()
            .insert(record.field.clone(), record.new_value.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entity;
    use crate::storage::InMemoryEntityStore;
    use tokio_test::block_on;

    struct Silent;

    impl FieldBinding for Silent {
        fn revert_field(&self, _: &EntityId, _: &str, _: &Value) -> Result<()> {
            Ok(())
        }
    }

    type MemoryEngine = ReconciliationEngine<Arc<InMemoryEntityStore>, Arc<InMemoryEntityStore>>;

    fn engine(store: &Arc<InMemoryEntityStore>) -> MemoryEngine {
        ReconciliationEngine::new(store.clone(), store.clone(), EngineConfig::new())
    }

    #[test]
    fn test_group_by_entity_first_seen_order() {
        let binding: Arc<dyn FieldBinding> = Arc::new(Silent);
        let mut tracker = ChangeTracker::new();
        tracker.track(2i64.into(), "company", "B".into(), Value::Null, Arc::downgrade(&binding));
        tracker.track(1i64.into(), "company", "A".into(), Value::Null, Arc::downgrade(&binding));
        tracker.track(2i64.into(), "stage", "Offer".into(), Value::Null, Arc::downgrade(&binding));

        let groups = group_by_entity(&tracker.snapshot());
        let ids: Vec<_> = groups.keys().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(groups[&EntityId::from(2i64)].len(), 2);
    }

    #[test]
    fn test_commit_merges_into_store() {
        let store = Arc::new(InMemoryEntityStore::from_entities([
            Entity::new(1i64).with_field("company", "OldCo").with_field("stage", "Applied"),
        ]));
        let engine = engine(&store);
        let binding: Arc<dyn FieldBinding> = Arc::new(Silent);

        engine.track_change(1i64, "company", "Acme", "OldCo", &binding);
        engine.track_change(1i64, "date_applied", "2024-03-01", Value::Null, &binding);
        assert!(engine.has_unsaved_changes());
        assert!(engine.show_notification());

        let report = block_on(engine.commit());
        assert!(report.is_clean());
        assert_eq!(report.committed, vec![EntityId::from(1i64)]);
        assert!(!engine.has_unsaved_changes());
        assert_eq!(engine.notification_phase(), NotificationPhase::Quiescent);

        let saved = block_on(store.get_by_id(&EntityId::from(1i64))).unwrap().unwrap();
        assert_eq!(saved.get("company"), Some(&Value::from("Acme")));
        assert_eq!(saved.get("stage"), Some(&Value::from("Applied")));
        assert_eq!(
            saved.get("date_applied").map(|v| v.to_string()),
            Some("2024-03-01T00:00:00.000Z".to_string())
        );
    }

    #[test]
    fn test_discard_skips_dropped_bindings() {
        let store = Arc::new(InMemoryEntityStore::new());
        let engine = engine(&store);
        let binding: Arc<dyn FieldBinding> = Arc::new(Silent);

        engine.track_change(1i64, "company", "Acme", "OldCo", &binding);
        drop(binding);

        let report = engine.discard();
        assert_eq!(report.reverted, 0);
        assert_eq!(report.detached.len(), 1);
        assert!(!engine.show_notification());
    }
}
