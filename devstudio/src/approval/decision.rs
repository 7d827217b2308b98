//! Approval requests and decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StudioError;

/// A pending request for a human decision on one stage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request ID.
    pub id: Uuid,
    /// Run that produced the result.
    pub run_id: Uuid,
    /// Stage that requested approval.
    pub stage: String,
    /// Message shown to the approving actor.
    pub message: String,
    /// The stage content awaiting approval.
    pub payload: serde_json::Value,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Creates a new approval request.
    #[must_use]
    pub fn new(
        run_id: Uuid,
        stage: impl Into<String>,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            stage: stage.into(),
            message: message.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// The resolution of an [`ApprovalRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// The actor allowed the pipeline to continue.
    Approved,
    /// The actor refused.
    Rejected {
        /// Optional explanation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ApprovalDecision {
    /// Creates a rejection.
    #[must_use]
    pub fn rejected(reason: Option<String>) -> Self {
        Self::Rejected { reason }
    }

    /// Returns true if approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Converts a rejection into `ApprovalRejected` for `stage`.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalRejected` when the decision is a rejection.
    pub fn into_result(self, stage: &str) -> Result<(), StudioError> {
        match self {
            Self::Approved => Ok(()),
            Self::Rejected { reason } => Err(StudioError::ApprovalRejected {
                stage: stage.to_string(),
                reason,
            }),
        }
    }
}

impl std::fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected { .. } => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_new() {
        let run_id = Uuid::new_v4();
        let request = ApprovalRequest::new(run_id, "infrastructure", "confirm?", json!({"a": 1}));
        assert_eq!(request.run_id, run_id);
        assert_eq!(request.stage, "infrastructure");
        assert_ne!(request.id, run_id);
    }

    #[test]
    fn test_decision_into_result() {
        assert!(ApprovalDecision::Approved.into_result("infrastructure").is_ok());

        let err = ApprovalDecision::rejected(Some("no budget".to_string()))
            .into_result("infrastructure")
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::ApprovalRejected { ref reason, .. } if reason.as_deref() == Some("no budget")
        ));
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(
            serde_json::to_value(ApprovalDecision::Approved).unwrap(),
            json!({"decision": "approved"})
        );
        assert_eq!(
            serde_json::to_value(ApprovalDecision::rejected(None)).unwrap(),
            json!({"decision": "rejected"})
        );
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(ApprovalDecision::Approved.to_string(), "approved");
        assert_eq!(ApprovalDecision::rejected(None).to_string(), "rejected");
    }
}
