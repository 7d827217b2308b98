//! One-line summaries of runs and stages.
//!
//! A wide event carries everything needed to understand a run without
//! replaying its individual events.

use crate::core::StageRecord;
use crate::pipeline::PipelineRun;

/// Builds a stage payload.
#[must_use]
pub fn stage_summary(record: &StageRecord) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "stage": record.stage,
        "kind": record.kind,
        "status": record.status.to_string(),
        "started_at": record.started_at.to_rfc3339(),
        "ended_at": record.ended_at.to_rfc3339(),
        "duration_ms": record.duration_ms(),
    });

    if let Some(decision) = &record.approval {
        payload["approval"] = serde_json::json!(decision.to_string());
    }
    if let Some(err) = &record.error {
        payload["error"] = serde_json::json!(err);
    }
    payload
}

/// Builds a pipeline payload.
#[must_use]
pub fn run_summary(run: &PipelineRun) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "run_id": run.run_id().to_string(),
        "project_name": run.identity().project_name,
        "status": run.status().to_string(),
        "started_at": run.identity().started_at.to_rfc3339(),
        "duration_ms": run.duration_ms(),
        "context_keys": run.context().keys(),
        "stages": run.records().iter().map(stage_summary).collect::<Vec<_>>(),
    });

    if let Some(stage) = run.failed_stage() {
        payload["failed_stage"] = serde_json::json!(stage);
    }
    if let Some(err) = run.error() {
        payload["error"] = serde_json::json!(err);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::ApprovalDecision;
    use crate::context::{Context, RunIdentity};
    use crate::core::{StageKind, StageResult};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_stage_summary() {
        let record = StageRecord::completed(
            "infrastructure",
            StageKind::Infrastructure,
            Utc::now(),
            StageResult::success(json!({})),
            Some(ApprovalDecision::Approved),
        );
        let payload = stage_summary(&record);
        assert_eq!(payload["kind"], "infrastructure");
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["approval"], "approved");
        assert!(payload.get("error").is_none());
    }

    #[test]
    fn test_run_summary_failed() {
        let mut run = PipelineRun::new(RunIdentity::new("TodoApp"), Context::new());
        run.push_record(StageRecord::failed(
            "design",
            StageKind::Design,
            Utc::now(),
            StageResult::failure("boom"),
            "boom",
        ));
        run.fail(Some("design"), "boom");

        let payload = run_summary(&run);
        assert_eq!(payload["project_name"], "TodoApp");
        assert_eq!(payload["status"], "failed");
        assert_eq!(payload["failed_stage"], "design");
        assert_eq!(payload["stages"][0]["error"], "boom");
    }
}
