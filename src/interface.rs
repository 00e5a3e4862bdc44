use crate::core::{Entity, EntityId, Result, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the external entity storage.
///
/// Implementations must hand out an independent copy: the engine merges
/// pending edits into the returned snapshot and never writes back through it.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch the authoritative current snapshot, `None` if the entity is gone.
    async fn get_by_id(&self, id: &EntityId) -> Result<Option<Entity>>;
}

/// Write side of the external entity storage.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Persist a fully merged entity. One call per entity per commit.
    async fn update(&self, id: &EntityId, entity: Entity) -> Result<()>;
}

/// A UI element that can be told to show a field's pre-edit value again.
///
/// Called synchronously during discard. Returning an error only marks the
/// revert as failed in the discard report; the remaining bindings still run.
pub trait FieldBinding: Send + Sync {
    fn revert_field(&self, entity_id: &EntityId, field: &str, value: &Value) -> Result<()>;
}

#[async_trait]
impl<T: EntityStore + ?Sized> EntityStore for Arc<T> {
    async fn get_by_id(&self, id: &EntityId) -> Result<Option<Entity>> {
        (**self).get_by_id(id).await
    }
}

#[async_trait]
impl<T: PersistenceGateway + ?Sized> PersistenceGateway for Arc<T> {
    async fn update(&self, id: &EntityId, entity: Entity) -> Result<()> {
        (**self).update(id, entity).await
    }
}
