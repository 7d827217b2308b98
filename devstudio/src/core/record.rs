//! Per-stage history entries kept by a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StageKind, StageResult};
use crate::approval::ApprovalDecision;

/// Final state of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// The stage content was accepted into the context.
    Completed,
    /// The stage failed or its approval was not granted.
    Failed,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// History entry for a stage executed within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub stage: String,
    /// Stage kind.
    pub kind: StageKind,
    /// Final status.
    pub status: RecordStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage (and its approval, if any) finished.
    pub ended_at: DateTime<Utc>,
    /// The raw result returned by the stage.
    pub result: StageResult,
    /// Approval decision, when the stage required one and it was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalDecision>,
    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    /// Creates a completed record.
    #[must_use]
    pub fn completed(
        stage: impl Into<String>,
        kind: StageKind,
        started_at: DateTime<Utc>,
        result: StageResult,
        approval: Option<ApprovalDecision>,
    ) -> Self {
        Self {
            stage: stage.into(),
            kind,
            status: RecordStatus::Completed,
            started_at,
            ended_at: Utc::now(),
            result,
            approval,
            error: None,
        }
    }

    /// Creates a failed record.
    #[must_use]
    pub fn failed(
        stage: impl Into<String>,
        kind: StageKind,
        started_at: DateTime<Utc>,
        result: StageResult,
        error: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            kind,
            status: RecordStatus::Failed,
            started_at,
            ended_at: Utc::now(),
            result,
            approval: None,
            error: Some(error.into()),
        }
    }

    /// Attaches the approval decision.
    #[must_use]
    pub fn with_approval(mut self, decision: ApprovalDecision) -> Self {
        self.approval = Some(decision);
        self
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, RecordStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_completed() {
        let started = Utc::now();
        let record = StageRecord::completed(
            "design",
            StageKind::Design,
            started,
            StageResult::success(json!({})),
            None,
        );

        assert_eq!(record.stage, "design");
        assert!(record.is_success());
        assert!(record.error.is_none());
        assert!(record.approval.is_none());
    }

    #[test]
    fn test_record_failed_with_approval() {
        let started = Utc::now();
        let record = StageRecord::failed(
            "infrastructure",
            StageKind::Infrastructure,
            started,
            StageResult::needs_approval(json!({}), "confirm"),
            "Approval rejected",
        )
        .with_approval(ApprovalDecision::rejected(None));

        assert!(!record.is_success());
        assert_eq!(record.error.as_deref(), Some("Approval rejected"));
        assert!(matches!(record.approval, Some(ApprovalDecision::Rejected { .. })));
    }

    #[test]
    fn test_record_duration() {
        let started = Utc::now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let record = StageRecord::completed(
            "code",
            StageKind::CodeGeneration,
            started,
            StageResult::success(json!({})),
            None,
        );

        assert!(record.duration_ms() >= 10.0);
    }

    #[test]
    fn test_record_status_display() {
        assert_eq!(RecordStatus::Completed.to_string(), "completed");
        assert_eq!(RecordStatus::Failed.to_string(), "failed");
    }
}
