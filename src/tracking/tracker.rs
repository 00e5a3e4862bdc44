// ============================================================================
// Change Tracker
// ============================================================================
//
// In-memory index of pending edits keyed by (entity id, field).
// Iteration follows the order in which each key was first tracked; an
// overwrite updates the record in place and keeps its position.
//
// ============================================================================

use super::ChangeRecord;
use crate::core::{EntityId, FieldKey, Value};
use crate::interface::FieldBinding;
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::sync::Weak;

#[derive(Debug, Default)]
pub struct ChangeTracker {
    records: IndexMap<FieldKey, ChangeRecord>,
    next_revision: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `(entity_id, field)`.
    ///
    /// On overwrite the new value, binding and revision are replaced while the
    /// first `original_value` is kept. Returns `true` when the key was new.
    pub fn track(
        &mut self,
        entity_id: EntityId,
        field: impl Into<String>,
        new_value: Value,
        original_value: Value,
        binding: Weak<dyn FieldBinding>,
    ) -> bool {
        self.next_revision += 1;
        let revision = self.next_revision;
        let field = field.into();

        match self.records.entry(FieldKey::new(entity_id.clone(), field.clone())) {
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                record.new_value = new_value;
                record.binding = binding;
                record.revision = revision;
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(ChangeRecord {
                    entity_id,
                    field,
                    new_value,
                    original_value,
                    binding,
                    revision,
                });
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, key: &FieldKey) -> Option<&ChangeRecord> {
        self.records.get(key)
    }

    /// All records in first-tracked order
    pub fn all(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    /// Owned copy of the current change set
    pub fn snapshot(&self) -> Vec<ChangeRecord> {
        self.records.values().cloned().collect()
    }

    /// Keep only the records matching `keep`, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(&ChangeRecord) -> bool) {
        self.records.retain(|_, record| keep(record));
    }

    /// Empty the set and hand back what it held, in order
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        self.records.drain(..).map(|(_, record)| record).collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Result;
    use std::sync::Arc;

    struct Silent;

    impl FieldBinding for Silent {
        fn revert_field(&self, _: &EntityId, _: &str, _: &Value) -> Result<()> {
            Ok(())
        }
    }

    fn binding() -> Arc<dyn FieldBinding> {
        Arc::new(Silent)
    }

    #[test]
    fn test_track_and_clear() {
        let b = binding();
        let mut tracker = ChangeTracker::new();
        assert!(tracker.is_empty());

        let weak = Arc::downgrade(&b);
        assert!(tracker.track(1i64.into(), "company", "Acme".into(), "OldCo".into(), weak));
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_empty());

        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_first_original() {
        let b = binding();
        let mut tracker = ChangeTracker::new();

        let weak = Arc::downgrade(&b);
        tracker.track(1i64.into(), "stage", "Interview".into(), "Applied".into(), weak.clone());
        let inserted =
            tracker.track(1i64.into(), "stage", "Offer".into(), "Interview".into(), weak);
        assert!(!inserted);
        assert_eq!(tracker.len(), 1);

        let record = tracker.get(&FieldKey::new(1i64.into(), "stage")).unwrap();
        assert_eq!(record.new_value, Value::from("Offer"));
        assert_eq!(record.original_value, Value::from("Applied"));
        assert_eq!(record.revision, 2);
    }

    #[test]
    fn test_order_is_first_insertion() {
        let b = binding();
        let mut tracker = ChangeTracker::new();

        tracker.track(1i64.into(), "company", "A".into(), Value::Null, Arc::downgrade(&b));
        tracker.track(2i64.into(), "position", "B".into(), Value::Null, Arc::downgrade(&b));
        tracker.track(1i64.into(), "company", "C".into(), Value::Null, Arc::downgrade(&b));

        let order: Vec<_> = tracker
            .all()
            .map(|r| (r.entity_id.to_string(), r.field.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("1".to_string(), "company".to_string()),
                ("2".to_string(), "position".to_string()),
            ]
        );
    }

    #[test]
    fn test_separator_characters_do_not_collide() {
        let b = binding();
        let mut tracker = ChangeTracker::new();

        tracker.track("a:b".into(), "c", 1i64.into(), Value::Null, Arc::downgrade(&b));
        tracker.track("a".into(), "b:c", 2i64.into(), Value::Null, Arc::downgrade(&b));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_drain_and_retain() {
        let b = binding();
        let mut tracker = ChangeTracker::new();
        tracker.track(1i64.into(), "x", 1i64.into(), Value::Null, Arc::downgrade(&b));
        tracker.track(2i64.into(), "y", 2i64.into(), Value::Null, Arc::downgrade(&b));
        tracker.track(3i64.into(), "z", 3i64.into(), Value::Null, Arc::downgrade(&b));

        tracker.retain(|r| r.entity_id != EntityId::from(2i64));
        let drained = tracker.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].field, "x");
        assert_eq!(drained[1].field, "z");
        assert!(tracker.is_empty());
    }
}
