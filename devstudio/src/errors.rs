//! Error types for the devstudio pipeline.
//!
//! Errors are split by layer:
//! - [`RetryError`] and [`AttemptError`] are produced by [`crate::pipeline::RetryableCall`]
//! - [`StudioError`] is the crate-wide taxonomy that stages fold into a
//!   failure reason and that the approval gate and configuration loaders return

use std::time::Duration;
use thiserror::Error;

use crate::core::RunStatus;

/// The main error type for devstudio operations.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Every attempt of an external call failed.
    #[error("Call '{call}' exhausted {attempts} attempt(s): {last_error}")]
    ExhaustedRetries {
        /// Name of the call site.
        call: String,
        /// Number of invocations made.
        attempts: u32,
        /// Rendered error of the final attempt.
        last_error: String,
    },

    /// An external call succeeded but its output has the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any other stage-internal error.
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailure {
        /// Stage name.
        stage: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A human actor rejected the approval request.
    #[error("Approval rejected for stage '{stage}'{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    ApprovalRejected {
        /// Stage that requested approval.
        stage: String,
        /// Optional reason given by the actor.
        reason: Option<String>,
    },

    /// No approval decision arrived within the configured window.
    #[error("Approval for stage '{stage}' timed out after {}s", .timeout.as_secs_f64())]
    ApprovalTimeout {
        /// Stage that requested approval.
        stage: String,
        /// The configured window.
        timeout: Duration,
    },

    /// The approval transport went away before a decision was recorded.
    #[error("Approval for stage '{stage}' unavailable: {reason}")]
    ApprovalUnavailable {
        /// Stage that requested approval.
        stage: String,
        /// Transport failure description.
        reason: String,
    },

    /// The run was cancelled.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// The inbound request is unusable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A run status change not allowed by the run state machine.
    #[error("Invalid run status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },

    /// A context key was written twice.
    #[error("{0}")]
    DataConflict(#[from] DataConflictError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Creates a stage failure.
    #[must_use]
    pub fn stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StageFailure {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for the approval-related variants.
    #[must_use]
    pub fn is_approval_error(&self) -> bool {
        matches!(
            self,
            Self::ApprovalRejected { .. }
                | Self::ApprovalTimeout { .. }
                | Self::ApprovalUnavailable { .. }
        )
    }
}

/// Error raised when writing to an existing key in a [`crate::context::Context`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Data conflict: key '{key}' already exists")]
pub struct DataConflictError {
    /// The conflicting key.
    pub key: String,
}

impl DataConflictError {
    /// Creates a new data conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Failure of a single attempt inside a retryable call.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    /// The operation returned an error.
    #[error("{0}")]
    Failed(E),
    /// The operation exceeded its per-call timeout.
    #[error("call timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Terminal outcome of a retryable call that did not succeed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All attempts failed.
    #[error("exhausted {attempts} attempt(s): {last_error}")]
    ExhaustedRetries {
        /// Number of invocations made.
        attempts: u32,
        /// Error of the final attempt.
        last_error: AttemptError<E>,
    },
    /// Cancellation was requested while waiting between attempts.
    #[error("retry cancelled: {0}")]
    Cancelled(String),
}

impl<E> RetryError<E> {
    /// Returns the number of attempts made, if the retries were exhausted.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ExhaustedRetries { attempts, .. } => Some(*attempts),
            Self::Cancelled(_) => None,
        }
    }
}

impl<E: std::fmt::Display> RetryError<E> {
    /// Converts into the crate-wide taxonomy, naming the call site.
    pub fn into_studio_error(self, call: impl Into<String>) -> StudioError {
        match self {
            Self::ExhaustedRetries {
                attempts,
                last_error,
            } => StudioError::ExhaustedRetries {
                call: call.into(),
                attempts,
                last_error: last_error.to_string(),
            },
            Self::Cancelled(reason) => StudioError::Cancelled(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_conflict_error() {
        let err = DataConflictError::new("design");
        assert_eq!(err.key, "design");
        assert!(err.to_string().contains("design"));
    }

    #[test]
    fn test_data_conflict_into_studio_error() {
        let err: StudioError = DataConflictError::new("infra").into();
        assert!(matches!(err, StudioError::DataConflict(_)));
    }

    #[test]
    fn test_approval_rejected_display() {
        let with_reason = StudioError::ApprovalRejected {
            stage: "infrastructure".to_string(),
            reason: Some("too expensive".to_string()),
        };
        assert_eq!(
            with_reason.to_string(),
            "Approval rejected for stage 'infrastructure': too expensive"
        );

        let without_reason = StudioError::ApprovalRejected {
            stage: "infrastructure".to_string(),
            reason: None,
        };
        assert_eq!(
            without_reason.to_string(),
            "Approval rejected for stage 'infrastructure'"
        );
    }

    #[test]
    fn test_approval_timeout_display() {
        let err = StudioError::ApprovalTimeout {
            stage: "infrastructure".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
        assert!(err.is_approval_error());
    }

    #[test]
    fn test_retry_error_into_studio_error() {
        let err: RetryError<String> = RetryError::ExhaustedRetries {
            attempts: 3,
            last_error: AttemptError::Failed("503 unavailable".to_string()),
        };
        assert_eq!(err.attempts(), Some(3));

        let studio = err.into_studio_error("idea_generator");
        match studio {
            StudioError::ExhaustedRetries {
                call,
                attempts,
                last_error,
            } => {
                assert_eq!(call, "idea_generator");
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "503 unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_attempt_timeout_display() {
        let err: AttemptError<String> = AttemptError::TimedOut(Duration::from_millis(250));
        assert_eq!(err.to_string(), "call timed out after 250ms");
    }
}
