//! Everything a view-model layer needs to wire up the engine.

pub use crate::config::{CommitFailurePolicy, DrainMode, EngineConfig};
pub use crate::core::{Entity, EntityId, ReconcileError, Result, Value};
pub use crate::interface::{EntityStore, FieldBinding, PersistenceGateway};
pub use crate::reconcile::{CommitReport, DiscardReport, ReconciliationEngine};
