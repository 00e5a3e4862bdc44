// ============================================================================
// Edit Reconciler Library
// ============================================================================
//
// Unsaved-changes tracking for form-driven clients: field-level edits across
// many open entities are held in memory until they are either committed
// (one merged update per entity) or discarded (every edited control is told
// to show its pre-edit value again).
//
// ============================================================================

//! # Example
//!
//! ```
//! use edit_reconciler::{
//!     Entity, EngineConfig, FieldBinding, InMemoryEntityStore, ReconciliationEngine, Value,
//!     EntityId, Result,
//! };
//! use std::sync::Arc;
//!
//! struct CompanyInput;
//!
//! impl FieldBinding for CompanyInput {
//!     fn revert_field(&self, _id: &EntityId, _field: &str, _value: &Value) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryEntityStore::from_entities([
//!     Entity::new(1i64).with_field("company", "OldCo"),
//! ]));
//! let engine = ReconciliationEngine::new(store.clone(), store.clone(), EngineConfig::new());
//!
//! let input: Arc<dyn FieldBinding> = Arc::new(CompanyInput);
//! engine.track_change(1i64, "company", "Acme", "OldCo", &input);
//! assert!(engine.has_unsaved_changes());
//!
//! let report = engine.commit().await;
//! assert!(report.is_clean());
//! assert!(!engine.show_notification());
//! # }
//! ```

pub mod config;
pub mod core;
pub mod interface;
pub mod notification;
pub mod prelude;
pub mod reconcile;
pub mod storage;
pub mod tracking;

// Re-export main types for convenience
pub use crate::config::{CommitFailurePolicy, DrainMode, EngineConfig};
pub use crate::core::{Entity, EntityId, FieldKey, ReconcileError, Result, Value};
pub use crate::interface::{EntityStore, FieldBinding, PersistenceGateway};
pub use crate::notification::{NotificationPhase, NotificationState};
pub use crate::reconcile::{CommitReport, DiscardReport, EntityFailure, ReconciliationEngine};
pub use crate::storage::InMemoryEntityStore;
pub use crate::tracking::{ChangeRecord, ChangeTracker};
