//! Run identity for tracking pipeline executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this pipeline run.
    pub run_id: Uuid,
    /// Project the run was started for.
    pub project_name: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a new run identity with a generated run ID.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self::with_run_id(Uuid::new_v4(), project_name)
    }

    /// Creates a run identity with a specific run ID.
    #[must_use]
    pub fn with_run_id(run_id: Uuid, project_name: impl Into<String>) -> Self {
        Self {
            run_id,
            project_name: project_name.into(),
            started_at: Utc::now(),
        }
    }

    /// Returns elapsed milliseconds since the run started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let a = RunIdentity::new("TodoApp");
        let b = RunIdentity::new("TodoApp");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.project_name, "TodoApp");
    }

    #[test]
    fn test_with_run_id() {
        let id = Uuid::new_v4();
        let identity = RunIdentity::with_run_id(id, "P");
        assert_eq!(identity.run_id, id);
        assert!(identity.elapsed_ms() >= 0);
    }
}
