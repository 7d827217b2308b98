//! Aggregated result returned to the caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PipelineRun;
use crate::core::StageKind;

/// Overall outcome reported in a [`FinalOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    /// Every stage completed.
    Complete,
    /// The run stopped early.
    Failed,
}

/// The single aggregated result of a run.
///
/// Either all three stage payloads are present and `status` is `complete`,
/// or none is and `status` is `failed` with an `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutput {
    /// Run that produced this output.
    pub run_id: Uuid,
    /// Design spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<serde_json::Value>,
    /// Infrastructure plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<serde_json::Value>,
    /// Generated application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<serde_json::Value>,
    /// Outcome.
    pub status: OutputStatus,
    /// Stage at which the run stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
    /// Human-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FinalOutput {
    /// Builds the output for a finished run.
    ///
    /// A run that did not complete yields a failed output, even if some
    /// stage content exists in its context.
    #[must_use]
    pub fn from_run(run: &PipelineRun) -> Self {
        let content = |kind: StageKind| run.stage_content(kind).cloned();
        let all = (
            content(StageKind::Design),
            content(StageKind::Infrastructure),
            content(StageKind::CodeGeneration),
        );

        match all {
            (Some(design), Some(infrastructure), Some(application)) if run.is_completed() => {
                Self {
                    run_id: run.run_id(),
                    design: Some(design),
                    infrastructure: Some(infrastructure),
                    application: Some(application),
                    status: OutputStatus::Complete,
                    failed_stage: None,
                    error: None,
                }
            }
            _ => Self {
                run_id: run.run_id(),
                design: None,
                infrastructure: None,
                application: None,
                status: OutputStatus::Failed,
                failed_stage: run.failed_stage().map(str::to_string),
                error: Some(
                    run.error()
                        .unwrap_or("pipeline did not complete")
                        .to_string(),
                ),
            },
        }
    }

    /// Returns true if the run completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == OutputStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, RunIdentity};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_complete_output() {
        let mut run = PipelineRun::new(RunIdentity::new("p"), Context::new());
        for kind in StageKind::ORDER {
            run.append_stage_content(kind, json!({"kind": kind.to_string()}))
                .unwrap();
        }
        run.complete().unwrap();

        let output = run.to_output();
        assert!(output.is_complete());
        assert_eq!(output.application, Some(json!({"kind": "code_generation"})));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "complete");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_output_has_no_partial_content() {
        let mut run = PipelineRun::new(RunIdentity::new("p"), Context::new());
        run.append_stage_content(StageKind::Design, json!({})).unwrap();
        run.fail(Some("infrastructure"), "Approval rejected for stage 'infrastructure'");

        let output = run.to_output();
        assert_eq!(output.status, OutputStatus::Failed);
        assert!(output.design.is_none());
        assert!(output.infrastructure.is_none());
        assert!(output.application.is_none());
        assert_eq!(output.failed_stage.as_deref(), Some("infrastructure"));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("design").is_none());
    }

    #[test]
    fn test_running_run_reports_failed() {
        let run = PipelineRun::new(RunIdentity::new("p"), Context::new());
        let output = FinalOutput::from_run(&run);
        assert_eq!(output.error.as_deref(), Some("pipeline did not complete"));
    }
}
