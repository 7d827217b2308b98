//! State of one end-to-end pipeline execution.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::FinalOutput;
use crate::context::{Context, RunIdentity};
use crate::core::{RunStatus, StageKind, StageRecord};
use crate::errors::StudioError;

/// Context key the design content is also published under.
pub const SPEC_KEY: &str = "spec";

/// One pipeline invocation: identity, status, context and stage history.
///
/// A run owns its context exclusively. Stage content is appended through
/// [`PipelineRun::append_stage_content`] and never overwritten.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    identity: RunIdentity,
    status: RunStatus,
    context: Context,
    records: Vec<StageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Creates a running run over an initial context.
    #[must_use]
    pub fn new(identity: RunIdentity, context: Context) -> Self {
        Self {
            identity,
            status: RunStatus::Running,
            context,
            records: Vec::new(),
            failed_stage: None,
            error: None,
            ended_at: None,
        }
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.identity.run_id
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the accumulated context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the stage history, in execution order.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Returns the name of the stage that failed the run.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        self.failed_stage.as_deref()
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true if every stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Returns the run duration in milliseconds, once ended.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.identity.started_at).num_milliseconds())
    }

    /// Moves the run to `next`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the move is not allowed from the
    /// current status.
    pub fn transition(&mut self, next: RunStatus) -> Result<(), StudioError> {
        if !self.status.can_transition_to(next) {
            return Err(StudioError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(run_id = %self.identity.run_id, from = %self.status, to = %next, "Run status changed");
        self.status = next;
        if next.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Appends accepted stage content under the stage's context key.
    ///
    /// Design content is also published as `spec`. Either every key is
    /// written or none is.
    ///
    /// # Errors
    ///
    /// Returns `DataConflict` if a key is already present.
    pub fn append_stage_content(
        &mut self,
        kind: StageKind,
        content: serde_json::Value,
    ) -> Result<(), StudioError> {
        let mut entries = Vec::with_capacity(2);
        if kind == StageKind::Design {
            entries.push((SPEC_KEY.to_string(), content.clone()));
        }
        entries.push((kind.context_key().to_string(), content));
        self.context.extend(entries)?;
        Ok(())
    }

    /// Returns the accepted content of a stage, if it has run.
    #[must_use]
    pub fn stage_content(&self, kind: StageKind) -> Option<&serde_json::Value> {
        self.context.get(kind.context_key())
    }

    /// Adds a stage record.
    pub fn push_record(&mut self, record: StageRecord) {
        self.records.push(record);
    }

    /// Marks every stage done.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the run is running.
    pub fn complete(&mut self) -> Result<(), StudioError> {
        self.transition(RunStatus::Completed)
    }

    /// Fails the run, recording the stage and reason.
    ///
    /// A run that has already ended keeps its first outcome.
    pub fn fail(&mut self, stage: Option<&str>, reason: impl Into<String>) {
        if self.transition(RunStatus::Failed).is_ok() {
            self.failed_stage = stage.map(str::to_string);
            self.error = Some(reason.into());
        }
    }

    /// Builds the caller-facing result.
    #[must_use]
    pub fn to_output(&self) -> FinalOutput {
        FinalOutput::from_run(self)
    }
}
