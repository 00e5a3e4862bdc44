use crate::core::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What happens to the edits of an entity whose commit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFailurePolicy {
    /// Every commit drains the whole change set, failed entities included.
    /// Unsaved work for a failed entity is lost.
    #[default]
    DiscardAll,

    /// Records of entities that failed with a retryable error stay pending.
    RetainFailed,
}

/// Which records the end of a commit removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainMode {
    /// Clear everything, including edits tracked while the commit was
    /// waiting on the store or gateway.
    #[default]
    Unconditional,

    /// Only remove records still at the revision captured when the commit
    /// started; later edits stay pending.
    Snapshot,
}

/// Reconciliation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Field names whose values are normalized to canonical timestamps on commit
    pub date_fields: BTreeSet<String>,

    pub failure_policy: CommitFailurePolicy,

    pub drain_mode: DrainMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a configuration with the default job-application date fields
    pub fn new() -> Self {
        Self {
            date_fields: ["date_applied", "date_updated", "interview_date", "follow_up_date"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            failure_policy: CommitFailurePolicy::default(),
            drain_mode: DrainMode::default(),
        }
    }

    /// Replace the set of date-typed field names
    pub fn date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add one date-typed field name
    pub fn date_field(mut self, field: impl Into<String>) -> Self {
        self.date_fields.insert(field.into());
        self
    }

    /// Set the commit failure policy
    pub fn failure_policy(mut self, policy: CommitFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the drain mode
    pub fn drain_mode(mut self, mode: DrainMode) -> Self {
        self.drain_mode = mode;
        self
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.contains(field)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.date_fields.iter().find(|f| f.trim().is_empty()) {
            return Err(ReconcileError::Config(format!(
                "date field name must not be blank (got {:?})",
                bad
            )));
        }
        Ok(())
    }

    /// Parse from JSON; missing keys fall back to defaults
    ///
    /// ```
    /// # use edit_reconciler::{EngineConfig, DrainMode};
    /// let config = EngineConfig::from_json_str(r#"{"drain_mode": "snapshot"}"#).unwrap();
    /// assert_eq!(config.drain_mode, DrainMode::Snapshot);
    /// assert!(config.is_date_field("date_applied"));
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
