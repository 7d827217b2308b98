//! Assertions over pipeline outputs and runs.

use crate::context::Context;
use crate::pipeline::{FinalOutput, OutputStatus, PipelineRun};

/// Asserts that the output is complete with all three payloads.
pub fn assert_complete(output: &FinalOutput) {
    assert_eq!(
        output.status,
        OutputStatus::Complete,
        "Expected complete output, got error: {:?}",
        output.error
    );
    assert!(output.design.is_some(), "complete output without design");
    assert!(output.infrastructure.is_some(), "complete output without infrastructure");
    assert!(output.application.is_some(), "complete output without application");
    assert!(output.error.is_none());
}

/// Asserts that the output failed at `stage` with no partial payloads.
pub fn assert_failed_at(output: &FinalOutput, stage: &str) {
    assert_eq!(output.status, OutputStatus::Failed, "Expected failed output");
    assert_eq!(output.failed_stage.as_deref(), Some(stage));
    assert!(output.error.is_some(), "failed output without error");
    assert!(
        output.design.is_none() && output.infrastructure.is_none() && output.application.is_none(),
        "failed output carries partial payloads"
    );
}

/// Asserts that each snapshot extends the previous one without changing it.
pub fn assert_append_only(snapshots: &[Context]) {
    for pair in snapshots.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        for key in before.keys() {
            assert_eq!(
                before.get(&key),
                after.get(&key),
                "context key '{key}' changed between stages"
            );
        }
        assert!(
            after.len() >= before.len(),
            "context shrank between stages"
        );
    }
}

/// Asserts that `run` holds every snapshot's entries unchanged.
pub fn assert_run_extends(run: &PipelineRun, snapshot: &Context) {
    for key in snapshot.keys() {
        assert_eq!(
            run.context().get(&key),
            snapshot.get(&key),
            "run context changed key '{key}'"
        );
    }
}
