// ============================================================================
// Change Record
// ============================================================================
//
// One pending edit to one field of one entity. Carries enough to both commit
// it (new value) and revert it (original value + the binding that shows it).
//
// ============================================================================

use crate::core::{EntityId, FieldKey, Value};
use crate::interface::FieldBinding;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub entity_id: EntityId,
    pub field: String,
    pub new_value: Value,
    /// Value seen before the first edit of this field; never overwritten.
    pub original_value: Value,
    /// Non-owning: the UI element may be gone by the time we revert.
    pub binding: Weak<dyn FieldBinding>,
    /// Tracker-wide sequence number of the latest edit to this field.
    pub revision: u64,
}

impl ChangeRecord {
    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.entity_id.clone(), self.field.clone())
    }

    /// Upgrade the binding, `None` if the UI element has been dropped
    pub fn binding(&self) -> Option<Arc<dyn FieldBinding>> {
        self.binding.upgrade()
    }
}
