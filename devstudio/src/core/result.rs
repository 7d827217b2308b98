//! Stage result type with factory methods.

use serde::{Deserialize, Serialize};

/// Approval metadata attached to a successful stage result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequirement {
    /// Message shown to the approving actor.
    pub message: String,
}

impl ApprovalRequirement {
    /// Creates a new approval requirement.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The outcome of a stage execution.
///
/// A success may carry an [`ApprovalRequirement`]; the pipeline must not
/// consume such content until the approval gate has resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    /// The stage produced usable content.
    Success {
        /// The stage content.
        content: serde_json::Value,
        /// Present when the content requires human approval.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approval: Option<ApprovalRequirement>,
    },
    /// The stage could not produce a usable result.
    Failure {
        /// Human-readable reason.
        reason: String,
    },
}

impl StageResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(content: serde_json::Value) -> Self {
        Self::Success {
            content,
            approval: None,
        }
    }

    /// Creates a successful result that requires approval.
    #[must_use]
    pub fn needs_approval(content: serde_json::Value, message: impl Into<String>) -> Self {
        Self::Success {
            content,
            approval: Some(ApprovalRequirement::new(message)),
        }
    }

    /// Creates a failure result.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Returns true if the result must pass the approval gate.
    #[must_use]
    pub fn approval_required(&self) -> bool {
        matches!(self, Self::Success { approval: Some(_), .. })
    }

    /// Returns the approval message, if approval is required.
    #[must_use]
    pub fn approval_message(&self) -> Option<&str> {
        match self {
            Self::Success {
                approval: Some(requirement),
                ..
            } => Some(&requirement.message),
            _ => None,
        }
    }

    /// Returns the content of a successful result.
    #[must_use]
    pub fn content(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success { content, .. } => Some(content),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failure { reason } => Some(reason),
            Self::Success { .. } => None,
        }
    }
}

impl<E: std::error::Error> From<Result<serde_json::Value, E>> for StageResult {
    fn from(result: Result<serde_json::Value, E>) -> Self {
        match result {
            Ok(content) => Self::success(content),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StudioError;
    use serde_json::json;

    #[test]
    fn test_success() {
        let result = StageResult::success(json!({"file": "index.html"}));
        assert!(result.is_success());
        assert!(!result.is_failure());
        assert!(!result.approval_required());
        assert_eq!(result.content(), Some(&json!({"file": "index.html"})));
        assert!(result.reason().is_none());
    }

    #[test]
    fn test_needs_approval() {
        let result = StageResult::needs_approval(json!({}), "Please confirm");
        assert!(result.is_success());
        assert!(result.approval_required());
        assert_eq!(result.approval_message(), Some("Please confirm"));
    }

    #[test]
    fn test_failure() {
        let result = StageResult::failure("missing goal");
        assert!(result.is_failure());
        assert!(!result.approval_required());
        assert_eq!(result.reason(), Some("missing goal"));
        assert!(result.content().is_none());
    }

    #[test]
    fn test_from_result() {
        let ok: Result<serde_json::Value, StudioError> = Ok(json!(1));
        assert!(StageResult::from(ok).is_success());

        let err: Result<serde_json::Value, StudioError> =
            Err(StudioError::MalformedResponse("not json".to_string()));
        let result = StageResult::from(err);
        assert_eq!(result.reason(), Some("Malformed response: not json"));
    }

    #[test]
    fn test_serialization_tags() {
        let json = serde_json::to_value(StageResult::needs_approval(json!({"a": 1}), "ok?")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["approval"]["message"], "ok?");

        let json = serde_json::to_value(StageResult::failure("boom")).unwrap();
        assert_eq!(json, json!({"status": "failure", "reason": "boom"}));
    }
}
