use super::types::EntityId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Entity '{0}' not found")]
    NotFound(EntityId),

    #[error("Persistence failure for entity '{entity_id}': {reason}")]
    PersistenceFailure { entity_id: EntityId, reason: String },

    #[error("Entity store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid date for field '{field}': {value}")]
    InvalidDate { field: String, value: String },

    #[error("Binding failed to revert field '{field}' of entity '{entity_id}': {reason}")]
    BindingFailure {
        entity_id: EntityId,
        field: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Failures that may succeed if the same edits are submitted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceFailure { .. } | Self::StoreUnavailable(_)
        )
    }

    pub fn persistence(entity_id: &EntityId, reason: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            entity_id: entity_id.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let id = EntityId::from(7i64);
        assert!(ReconcileError::persistence(&id, "timeout").is_retryable());
        assert!(ReconcileError::StoreUnavailable("down".into()).is_retryable());
        assert!(!ReconcileError::NotFound(id).is_retryable());
        assert!(
            !ReconcileError::InvalidDate {
                field: "date_applied".into(),
                value: "soon".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ReconcileError::persistence(&EntityId::from("42"), "rejected");
        assert_eq!(
            err.to_string(),
            "Persistence failure for entity '42': rejected"
        );
    }
}
