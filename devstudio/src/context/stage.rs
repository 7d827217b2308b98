//! The read-only view a stage executes against.

use std::sync::Arc;
use uuid::Uuid;

use super::{Context, RunIdentity};
use crate::cancellation::CancellationToken;
use crate::errors::StudioError;

/// Execution context handed to a single stage.
///
/// Holds a snapshot of the run context taken just before the stage started.
/// The stage can read it but never write back; the pipeline appends the
/// stage's content once the result has been accepted.
#[derive(Debug, Clone)]
pub struct StageContext {
    identity: RunIdentity,
    stage: String,
    inputs: Context,
    cancel: Arc<CancellationToken>,
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(
        identity: RunIdentity,
        stage: impl Into<String>,
        inputs: Context,
        cancel: Arc<CancellationToken>,
    ) -> Self {
        Self {
            identity,
            stage: stage.into(),
            inputs,
            cancel,
        }
    }

    /// Creates a context for running a stage outside a pipeline.
    #[must_use]
    pub fn detached(stage: impl Into<String>, inputs: Context) -> Self {
        let project = inputs
            .get_str("project_name")
            .unwrap_or(super::DEFAULT_PROJECT_NAME)
            .to_string();
        Self::new(
            RunIdentity::new(project),
            stage,
            inputs,
            Arc::new(CancellationToken::new()),
        )
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

    /// Returns the name of the executing stage.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage
    }

    /// Returns the context snapshot.
    #[must_use]
    pub fn inputs(&self) -> &Context {
        &self.inputs
    }

    /// Gets an input value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.inputs.get(key)
    }

    /// Gets an input value as a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inputs.get_str(key)
    }

    /// Gets an input the stage cannot run without.
    ///
    /// # Errors
    ///
    /// Returns `StageFailure` if the key is missing or null.
    pub fn require(&self, key: &str) -> Result<&serde_json::Value, StudioError> {
        self.inputs.require(&self.stage, key)
    }

    /// Returns the run's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.cancel)
    }

    /// Returns true if the run has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
