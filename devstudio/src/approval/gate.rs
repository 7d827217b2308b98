//! Suspension point for stage results that require human approval.

use std::sync::Arc;
use std::time::Duration;

use super::{ApprovalDecision, ApprovalNotifier, ApprovalRequest, AutoApprove, NotifierError};
use crate::cancellation::CancellationToken;
use crate::errors::StudioError;

/// Blocks pipeline progress until an approval request is resolved.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    notifier: Arc<dyn ApprovalNotifier>,
    timeout: Option<Duration>,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::auto_approve()
    }
}

impl ApprovalGate {
    /// Creates a gate backed by `notifier`, with no timeout.
    #[must_use]
    pub fn new(notifier: Arc<dyn ApprovalNotifier>) -> Self {
        Self {
            notifier,
            timeout: None,
        }
    }

    /// Creates a gate that approves everything.
    #[must_use]
    pub fn auto_approve() -> Self {
        Self::new(Arc::new(AutoApprove))
    }

    /// Sets the decision window.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the decision window, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Surfaces `request` and waits for the actor's decision.
    ///
    /// A returned `Rejected` decision is not an error here; callers turn it
    /// into `ApprovalRejected` with [`ApprovalDecision::into_result`].
    ///
    /// # Errors
    ///
    /// - `ApprovalTimeout` if the window elapses first
    /// - `Cancelled` if `cancel` fires while waiting
    /// - `ApprovalUnavailable` if the transport fails
    pub async fn await_decision(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> Result<ApprovalDecision, StudioError> {
        tracing::info!(
            stage = %request.stage,
            request_id = %request.id,
            message = %request.message,
            "Awaiting approval"
        );

        let decision = tokio::select! {
            decision = self.wait_for_decision(request) => decision?,
            () = cancel.cancelled() => {
                return Err(StudioError::Cancelled(cancel.reason().unwrap_or_default()));
            }
        };

        tracing::info!(
            stage = %request.stage,
            request_id = %request.id,
            decision = %decision,
            "Approval resolved"
        );
        Ok(decision)
    }

    async fn wait_for_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, StudioError> {
        let outcome = match self.timeout {
            Some(window) => {
                match tokio::time::timeout(window, self.notifier.request_decision(request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return Err(StudioError::ApprovalTimeout {
                            stage: request.stage.clone(),
                            timeout: window,
                        })
                    }
                }
            }
            None => self.notifier.request_decision(request).await,
        };

        outcome.map_err(|e: NotifierError| StudioError::ApprovalUnavailable {
            stage: request.stage.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::ChannelNotifier;
    use serde_json::json;
    use uuid::Uuid;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new(Uuid::new_v4(), "infrastructure", "confirm?", json!({}))
    }

    #[tokio::test]
    async fn test_auto_approve_gate() {
        let gate = ApprovalGate::default();
        let decision = gate
            .await_decision(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(decision.is_approved());
    }

    #[tokio::test]
    async fn test_rejection_is_returned() {
        let (notifier, mut listener) = ChannelNotifier::with_listener();
        let gate = ApprovalGate::new(Arc::new(notifier.clone()));

        let handle = tokio::spawn(async move {
            gate.await_decision(&request(), &CancellationToken::new()).await
        });

        let pending = listener.recv().await.unwrap();
        notifier.deny(pending.id, None);

        let decision = handle.await.unwrap().unwrap();
        assert_eq!(decision, ApprovalDecision::rejected(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let notifier = ChannelNotifier::new();
        let gate = ApprovalGate::new(Arc::new(notifier.clone())).with_timeout(Duration::from_secs(30));

        let err = gate
            .await_decision(&request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StudioError::ApprovalTimeout { timeout, .. } if timeout == Duration::from_secs(30)
        ));
        assert_eq!(notifier.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting() {
        let gate = ApprovalGate::new(Arc::new(ChannelNotifier::new()));
        let token = Arc::new(CancellationToken::new());

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                token.cancel("shutdown");
            })
        };

        let err = gate.await_decision(&request(), &token).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, StudioError::Cancelled(ref reason) if reason == "shutdown"));
    }

    #[tokio::test]
    async fn test_closed_channel_is_unavailable() {
        let (notifier, mut listener) = ChannelNotifier::with_listener();
        let gate = ApprovalGate::new(Arc::new(notifier.clone()));

        let handle = tokio::spawn(async move {
            gate.await_decision(&request(), &CancellationToken::new()).await
        });

        let pending = listener.recv().await.unwrap();
        notifier.cancel(pending.id);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, StudioError::ApprovalUnavailable { .. }));
    }
}
