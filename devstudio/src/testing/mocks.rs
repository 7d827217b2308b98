//! Test doubles for the studio collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::approval::{ApprovalDecision, ApprovalNotifier, ApprovalRequest, NotifierError};
use crate::context::StageContext;
use crate::core::{StageKind, StageResult};
use crate::ideas::{GenerationError, IdeaGenerator};
use crate::stages::Stage;

/// An idea generator that replays scripted responses.
///
/// Responses are consumed in order; once the script runs out the last
/// response is repeated.
#[derive(Debug)]
pub struct StubIdeaGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    last: Mutex<Option<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubIdeaGenerator {
    /// Creates a generator that always answers with `response`.
    #[must_use]
    pub fn always(response: impl Into<String>) -> Self {
        Self::scripted(vec![Ok(response.into())])
    }

    /// Creates a generator that always fails with `error`.
    #[must_use]
    pub fn failing(error: GenerationError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Creates a generator that replays `script`.
    #[must_use]
    pub fn scripted(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Returns every prompt received.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl IdeaGenerator for StubIdeaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());

        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(response) = next {
            *last = Some(response);
        }
        last.clone().unwrap_or(Err(GenerationError::EmptyResponse))
    }
}

/// Wraps a stage, counting calls and recording the context each call saw.
#[derive(Debug)]
pub struct CountingStage {
    inner: Arc<dyn Stage>,
    seen: Mutex<Vec<crate::context::Context>>,
}

impl CountingStage {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Stage>) -> Self {
        Self {
            inner,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the stage was executed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns the context snapshot of each execution.
    #[must_use]
    pub fn seen_contexts(&self) -> Vec<crate::context::Context> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Stage for CountingStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> StageKind {
        self.inner.kind()
    }

    async fn execute(&self, ctx: &StageContext) -> StageResult {
        self.seen.lock().push(ctx.inputs().clone());
        self.inner.execute(ctx).await
    }
}

/// An approval notifier that answers with scripted decisions.
///
/// With no decisions left it keeps approving. An optional delay is applied
/// before every answer.
#[derive(Debug, Default)]
pub struct ScriptedNotifier {
    decisions: Mutex<VecDeque<Result<ApprovalDecision, NotifierError>>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl ScriptedNotifier {
    /// Creates a notifier that approves everything.
    #[must_use]
    pub fn approving() -> Self {
        Self::default()
    }

    /// Creates a notifier that rejects the first request.
    #[must_use]
    pub fn rejecting(reason: Option<&str>) -> Self {
        Self::default().then(Ok(ApprovalDecision::rejected(reason.map(str::to_string))))
    }

    /// Queues an answer.
    #[must_use]
    pub fn then(self, answer: Result<ApprovalDecision, NotifierError>) -> Self {
        self.decisions.lock().push_back(answer);
        self
    }

    /// Delays every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ApprovalNotifier for ScriptedNotifier {
    async fn request_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, NotifierError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.decisions
            .lock()
            .pop_front()
            .unwrap_or(Ok(ApprovalDecision::Approved))
    }
}
