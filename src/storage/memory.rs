use crate::core::{Entity, EntityId, ReconcileError, Result};
use crate::interface::{EntityStore, PersistenceGateway};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Entity store and persistence gateway backed by a hash map.
///
/// Reads hand out clones; `update` replaces the stored entity wholesale and
/// rejects ids it does not hold.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: RwLock<HashMap<EntityId, Entity>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let entities = entities
            .into_iter()
            .map(|entity| (entity.id.clone(), entity))
            .collect();
        Self {
            entities: RwLock::new(entities),
        }
    }

    /// Load from a JSON array of entities
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entities: Vec<Entity> = serde_json::from_str(json)?;
        Ok(Self::from_entities(entities))
    }

    /// Dump all entities as a JSON array, ordered by id
    pub async fn to_json_string(&self) -> Result<String> {
        let entities = self.list().await;
        Ok(serde_json::to_string_pretty(&entities)?)
    }

    pub async fn list(&self) -> Vec<Entity> {
        let entities = self.entities.read().await;
        let mut all: Vec<Entity> = entities.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_by_id(&self, id: &EntityId) -> Result<Option<Entity>> {
        let entities = self.entities.read().await;
        Ok(entities.get(id).cloned())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryEntityStore {
    async fn update(&self, id: &EntityId, mut entity: Entity) -> Result<()> {
        let mut entities = self.entities.write().await;
        let Some(slot) = entities.get_mut(id) else {
            warn!("update rejected: entity '{}' does not exist", id);
            return Err(ReconcileError::persistence(id, "entity does not exist"));
        };

        if entity.id != *id {
            debug!("update for '{}' carried id '{}', keeping the stored id", id, entity.id);
            entity.id = id.clone();
        }
        *slot = entity;
        Ok(())
    }
}
