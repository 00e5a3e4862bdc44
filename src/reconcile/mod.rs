// ============================================================================
// Reconciliation Module
// ============================================================================
//
// Resolves the change set either by committing it (one merged update per
// entity) or by discarding it (reverting every edited UI control).
//
// ============================================================================

pub mod dates;
pub mod engine;
pub mod report;

pub use dates::normalize_timestamp;
pub use engine::ReconciliationEngine;
pub use report::{CommitReport, DiscardReport, EntityFailure};
