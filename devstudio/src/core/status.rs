//! Stage kind and run status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed stages of the studio pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Feature design and technical specification.
    Design,
    /// Resource planning for storage and hosting.
    Infrastructure,
    /// Single-file application generation.
    CodeGeneration,
}

impl StageKind {
    /// All stage kinds in pipeline order.
    pub const ORDER: [Self; 3] = [Self::Design, Self::Infrastructure, Self::CodeGeneration];

    /// Key under which the stage's content is appended to the run context.
    #[must_use]
    pub const fn context_key(self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Infrastructure => "infra",
            Self::CodeGeneration => "code",
        }
    }

    /// Key under which the stage's content appears in the final aggregate.
    #[must_use]
    pub const fn output_key(self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Infrastructure => "infrastructure",
            Self::CodeGeneration => "application",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Design => write!(f, "design"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::CodeGeneration => write!(f, "code_generation"),
        }
    }
}

/// Status of a single pipeline run.
///
/// Allowed transitions:
///
/// ```text
/// running ──► awaiting_approval ──► running
///    │               │
///    ├──► failed ◄───┘
///    └──► completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Stages are executing.
    Running,
    /// A stage result is waiting on the approval gate.
    AwaitingApproval,
    /// Every stage succeeded.
    Completed,
    /// A stage failed, approval was refused, or the run was cancelled.
    Failed,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::AwaitingApproval => write!(f, "awaiting_approval"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl RunStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the run may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::AwaitingApproval | Self::Completed | Self::Failed)
                | (Self::AwaitingApproval, Self::Running | Self::Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_keys() {
        assert_eq!(StageKind::Design.context_key(), "design");
        assert_eq!(StageKind::Infrastructure.context_key(), "infra");
        assert_eq!(StageKind::CodeGeneration.context_key(), "code");

        assert_eq!(StageKind::Design.output_key(), "design");
        assert_eq!(StageKind::Infrastructure.output_key(), "infrastructure");
        assert_eq!(StageKind::CodeGeneration.output_key(), "application");
    }

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Design.to_string(), "design");
        assert_eq!(StageKind::CodeGeneration.to_string(), "code_generation");
    }

    #[test]
    fn test_run_status_display() {
        assert_eq!(RunStatus::Running.to_string(), "running");
        assert_eq!(RunStatus::AwaitingApproval.to_string(), "awaiting_approval");
        assert_eq!(RunStatus::Completed.to_string(), "completed");
        assert_eq!(RunStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_run_status_is_terminal() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::AwaitingApproval.is_terminal());
    }

    #[test]
    fn test_run_status_transitions() {
        assert!(RunStatus::Running.can_transition_to(RunStatus::AwaitingApproval));
        assert!(RunStatus::AwaitingApproval.can_transition_to(RunStatus::Running));
        assert!(RunStatus::AwaitingApproval.can_transition_to(RunStatus::Failed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Completed));

        assert!(!RunStatus::AwaitingApproval.can_transition_to(RunStatus::Completed));
        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Running));
    }

    #[test]
    fn test_run_status_serialize() {
        let json = serde_json::to_string(&RunStatus::AwaitingApproval).unwrap();
        assert_eq!(json, r#""awaiting_approval""#);

        let deserialized: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, RunStatus::AwaitingApproval);
    }
}
