use crate::core::{EntityId, FieldKey, ReconcileError};

/// A per-entity commit failure. Never aborts the batch.
#[derive(Debug)]
pub struct EntityFailure {
    pub entity_id: EntityId,
    pub error: ReconcileError,
}

/// Outcome of one `commit()` call.
///
/// The notification flag does not distinguish a clean commit from a partial
/// one; callers that care inspect this report.
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Entities persisted, in the order their updates were issued
    pub committed: Vec<EntityId>,
    pub failures: Vec<EntityFailure>,
    /// Records still pending after the drain (retained failures and, in
    /// snapshot drain mode, edits tracked while the commit was in flight)
    pub retained: usize,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.committed.len() + self.failures.len()
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.failures.iter().map(|f| &f.entity_id)
    }
}

/// Outcome of one `discard()` call
#[derive(Debug, Default)]
pub struct DiscardReport {
    /// Bindings told to show the original value again
    pub reverted: usize,
    /// Records whose UI element no longer exists
    pub detached: Vec<FieldKey>,
    pub failures: Vec<ReconcileError>,
}

impl DiscardReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
