//! Transports that surface approval requests to a human actor.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{ApprovalDecision, ApprovalRequest};

/// Failure of an approval transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifierError {
    /// The request was withdrawn or the responder went away.
    #[error("approval channel closed")]
    Closed,
    /// The transport itself failed.
    #[error("approval transport failed: {0}")]
    Transport(String),
}

/// Boundary to whoever decides on approval requests.
///
/// Implementations may prompt on a terminal, push to a queue, or wait on a
/// web callback; the gate only needs the eventual decision.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync + std::fmt::Debug {
    /// Surfaces `request` and resolves once a decision is recorded.
    async fn request_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, NotifierError>;
}

/// Approves every request immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalNotifier for AutoApprove {
    async fn request_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, NotifierError> {
        tracing::debug!(stage = %request.stage, request_id = %request.id, "Auto-approving");
        Ok(ApprovalDecision::Approved)
    }
}

#[derive(Debug)]
struct PendingApproval {
    request: ApprovalRequest,
    response_tx: oneshot::Sender<ApprovalDecision>,
}

#[derive(Debug, Default)]
struct Inner {
    pending: RwLock<HashMap<Uuid, PendingApproval>>,
    listener: Option<mpsc::UnboundedSender<ApprovalRequest>>,
}

/// In-process notifier resolved by calling [`ChannelNotifier::approve`] or
/// [`ChannelNotifier::deny`] with the request id.
///
/// Cloning shares the pending set, so one handle can wait inside a pipeline
/// while another resolves requests.
#[derive(Debug, Clone, Default)]
pub struct ChannelNotifier {
    inner: Arc<Inner>,
}

impl ChannelNotifier {
    /// Creates a new channel notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that also announces each new request on a channel.
    #[must_use]
    pub fn with_listener() -> (Self, mpsc::UnboundedReceiver<ApprovalRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            inner: Arc::new(Inner {
                pending: RwLock::new(HashMap::new()),
                listener: Some(tx),
            }),
        };
        (notifier, rx)
    }

    /// Approves a pending request.
    pub fn approve(&self, request_id: Uuid) -> bool {
        self.resolve(request_id, ApprovalDecision::Approved)
    }

    /// Denies a pending request.
    pub fn deny(&self, request_id: Uuid, reason: Option<String>) -> bool {
        self.resolve(request_id, ApprovalDecision::rejected(reason))
    }

    /// Withdraws a pending request; the waiter sees `NotifierError::Closed`.
    pub fn cancel(&self, request_id: Uuid) -> bool {
        self.inner.pending.write().remove(&request_id).is_some()
    }

    /// Returns the number of pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.read().len()
    }

    /// Lists pending requests.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<ApprovalRequest> {
        self.inner
            .pending
            .read()
            .values()
            .map(|p| p.request.clone())
            .collect()
    }

    fn resolve(&self, request_id: Uuid, decision: ApprovalDecision) -> bool {
        match self.inner.pending.write().remove(&request_id) {
            Some(pending) => pending.response_tx.send(decision).is_ok(),
            None => false,
        }
    }
}

/// Removes the pending entry when the waiting future is dropped (timeout or
/// cancellation).
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending.write().remove(&self.id);
    }
}

#[async_trait]
impl ApprovalNotifier for ChannelNotifier {
    async fn request_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, NotifierError> {
        let (tx, rx) = oneshot::channel();
        self.inner.pending.write().insert(
            request.id,
            PendingApproval {
                request: request.clone(),
                response_tx: tx,
            },
        );
        let _guard = PendingGuard {
            inner: &self.inner,
            id: request.id,
        };

        if let Some(listener) = &self.inner.listener {
            if listener.send(request.clone()).is_err() {
                tracing::debug!(request_id = %request.id, "Approval listener dropped");
            }
        }

        rx.await.map_err(|_| NotifierError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new(Uuid::new_v4(), "infrastructure", "confirm?", json!({}))
    }

    #[tokio::test]
    async fn test_auto_approve() {
        let decision = AutoApprove.request_decision(&request()).await.unwrap();
        assert_eq!(decision, ApprovalDecision::Approved);
    }

    #[tokio::test]
    async fn test_channel_approved() {
        let (notifier, mut listener) = ChannelNotifier::with_listener();
        let waiter = notifier.clone();

        let handle = tokio::spawn(async move { waiter.request_decision(&request()).await });

        let pending = listener.recv().await.unwrap();
        assert_eq!(notifier.pending_count(), 1);
        assert_eq!(notifier.pending_requests()[0].id, pending.id);

        assert!(notifier.approve(pending.id));

        let result = handle.await.unwrap();
        assert_eq!(result, Ok(ApprovalDecision::Approved));
        assert_eq!(notifier.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_channel_denied() {
        let (notifier, mut listener) = ChannelNotifier::with_listener();
        let waiter = notifier.clone();

        let handle = tokio::spawn(async move { waiter.request_decision(&request()).await });

        let pending = listener.recv().await.unwrap();
        notifier.deny(pending.id, Some("not now".to_string()));

        let result = handle.await.unwrap();
        assert_eq!(
            result,
            Ok(ApprovalDecision::rejected(Some("not now".to_string())))
        );
    }

    #[tokio::test]
    async fn test_channel_cancelled() {
        let (notifier, mut listener) = ChannelNotifier::with_listener();
        let waiter = notifier.clone();

        let handle = tokio::spawn(async move { waiter.request_decision(&request()).await });

        let pending = listener.recv().await.unwrap();
        assert!(notifier.cancel(pending.id));

        assert_eq!(handle.await.unwrap(), Err(NotifierError::Closed));
    }

    #[tokio::test]
    async fn test_dropped_waiter_clears_pending() {
        let notifier = ChannelNotifier::new();
        let request = request();

        let result =
            tokio::time::timeout(Duration::from_millis(20), notifier.request_decision(&request)).await;

        assert!(result.is_err());
        assert_eq!(notifier.pending_count(), 0);
        assert!(!notifier.approve(request.id));
    }
}
