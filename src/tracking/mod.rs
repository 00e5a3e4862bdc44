// ============================================================================
// Change Tracking Module
// ============================================================================
//
// Accumulates field-level edits made across many open entities before they
// are persisted. Pure bookkeeping: no I/O and no UI awareness.
//
// ============================================================================

pub mod change;
pub mod tracker;

pub use change::ChangeRecord;
pub use tracker::ChangeTracker;
