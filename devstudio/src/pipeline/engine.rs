//! The orchestration engine that drives the three studio stages.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::{FinalOutput, PipelineBuilder, PipelineRun};
use crate::approval::{ApprovalDecision, ApprovalGate, ApprovalRequest};
use crate::cancellation::CancellationToken;
use crate::context::{Context, InboundRequest, RunIdentity, StageContext};
use crate::core::{RunStatus, StageRecord};
use crate::errors::StudioError;
use crate::events::{EventSink, PipelineEvent};
use crate::stages::Stage;

/// Why a stage stopped the run.
#[derive(Debug)]
struct StageHalt {
    stage: String,
    reason: String,
    cancelled: bool,
}

impl StageHalt {
    fn new(stage: &str, error: &StudioError) -> Self {
        Self {
            stage: stage.to_string(),
            reason: error.to_string(),
            cancelled: matches!(error, StudioError::Cancelled(_)),
        }
    }
}

/// Fixed design → infrastructure → code generation pipeline.
///
/// A pipeline holds no per-run state; clones share stages, gate and sink,
/// and can drive many runs concurrently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: [Arc<dyn Stage>; 3],
    gate: ApprovalGate,
    events: Arc<dyn EventSink>,
}

impl Pipeline {
    pub(super) fn from_parts(
        stages: [Arc<dyn Stage>; 3],
        gate: ApprovalGate,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            stages,
            gate,
            events,
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Returns the approval gate.
    #[must_use]
    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    /// Runs the pipeline and returns the aggregated output.
    pub async fn run(&self, request: InboundRequest) -> FinalOutput {
        self.execute(request, Arc::new(CancellationToken::new()))
            .await
            .to_output()
    }

    /// Drives independent runs concurrently, one per request.
    ///
    /// Outputs are returned in request order. Runs share nothing but the
    /// pipeline's stages, gate and sink.
    pub async fn run_many(&self, requests: Vec<InboundRequest>) -> Vec<FinalOutput> {
        futures::future::join_all(requests.into_iter().map(|request| self.run(request))).await
    }

    /// Runs the pipeline and returns the full run record.
    ///
    /// Every failure, including an invalid request or a cancellation, ends
    /// in a run whose status is `failed` with a reason.
    pub async fn execute(
        &self,
        request: InboundRequest,
        cancel: Arc<CancellationToken>,
    ) -> PipelineRun {
        let identity = RunIdentity::new(request.effective_project_name());
        let span = tracing::info_span!(
            "pipeline_run",
            run_id = %identity.run_id,
            project = %identity.project_name,
        );
        self.drive(identity, request, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        identity: RunIdentity,
        request: InboundRequest,
        cancel: Arc<CancellationToken>,
    ) -> PipelineRun {
        let started = Instant::now();
        let run_id = identity.run_id;

        let mut run = match request.into_context() {
            Ok(context) => PipelineRun::new(identity, context),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected inbound request");
                let mut run = PipelineRun::new(identity, Context::new());
                run.fail(None, e.to_string());
                self.emit(
                    PipelineEvent::new("pipeline.failed", run_id)
                        .with_data(json!({"error": e.to_string()})),
                );
                return run;
            }
        };

        tracing::info!("Pipeline started");
        self.emit(PipelineEvent::new("pipeline.started", run_id).with_data(json!({
            "project_name": run.identity().project_name,
            "stages": self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
        })));

        for stage in &self.stages {
            if cancel.is_cancelled() {
                let error = StudioError::Cancelled(cancel.reason().unwrap_or_default());
                return self.halt(run, StageHalt::new(stage.name(), &error), started);
            }

            if let Err(halt) = self.run_stage(&mut run, stage.as_ref(), &cancel).await {
                return self.halt(run, halt, started);
            }
        }

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        match run.complete() {
            Ok(()) => {
                tracing::info!(duration_ms, "Pipeline completed");
                self.emit(
                    PipelineEvent::new("pipeline.completed", run_id)
                        .with_data(json!({"duration_ms": duration_ms})),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Pipeline could not complete");
                run.fail(None, e.to_string());
            }
        }
        run
    }

    /// Executes one stage, resolves its approval, and appends its content.
    async fn run_stage(
        &self,
        run: &mut PipelineRun,
        stage: &dyn Stage,
        cancel: &Arc<CancellationToken>,
    ) -> Result<(), StageHalt> {
        let name = stage.name().to_string();
        let kind = stage.kind();
        let run_id = run.run_id();
        let span = tracing::info_span!("stage", stage = %name, kind = %kind);

        self.emit(PipelineEvent::new("stage.started", run_id).with_stage(&name));

        let started_at = Utc::now();
        let started = Instant::now();
        let ctx = StageContext::new(
            run.identity().clone(),
            &name,
            run.context().clone(),
            Arc::clone(cancel),
        );
        let result = stage.execute(&ctx).instrument(span.clone()).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Some(reason) = result.reason().map(str::to_string) {
            span.in_scope(|| tracing::warn!(reason = %reason, duration_ms, "Stage failed"));
            self.emit(
                PipelineEvent::new("stage.failed", run_id)
                    .with_stage(&name)
                    .with_data(json!({"error": reason, "duration_ms": duration_ms})),
            );
            run.push_record(StageRecord::failed(&name, kind, started_at, result, &reason));
            // A stage that bailed because the run was cancelled reports the cancellation.
            return Err(StageHalt {
                stage: name,
                reason,
                cancelled: cancel.is_cancelled(),
            });
        }

        let content = result.content().cloned().unwrap_or_default();
        let mut decision = None;

        if let Some(message) = result.approval_message().map(str::to_string) {
            run.transition(RunStatus::AwaitingApproval)
                .map_err(|e| StageHalt::new(&name, &e))?;

            let request = ApprovalRequest::new(run_id, &name, &message, content.clone());
            self.emit(
                PipelineEvent::new("approval.requested", run_id)
                    .with_stage(&name)
                    .with_data(json!({"request_id": request.id, "message": message})),
            );

            let resolved = self
                .gate
                .await_decision(&request, cancel)
                .instrument(span.clone())
                .await
                .and_then(|d| d.clone().into_result(&name).map(|()| d));

            match resolved {
                Ok(approved) => {
                    self.emit(
                        PipelineEvent::new("approval.granted", run_id)
                            .with_stage(&name)
                            .with_data(json!({"request_id": request.id})),
                    );
                    run.transition(RunStatus::Running)
                        .map_err(|e| StageHalt::new(&name, &e))?;
                    decision = Some(approved);
                }
                Err(error) => {
                    if !matches!(error, StudioError::Cancelled(_)) {
                        self.emit(
                            PipelineEvent::new("approval.rejected", run_id)
                                .with_stage(&name)
                                .with_data(json!({
                                    "request_id": request.id,
                                    "error": error.to_string(),
                                })),
                        );
                    }
                    let mut record =
                        StageRecord::failed(&name, kind, started_at, result, error.to_string());
                    if let StudioError::ApprovalRejected { reason, .. } = &error {
                        record = record.with_approval(ApprovalDecision::rejected(reason.clone()));
                    }
                    run.push_record(record);
                    return Err(StageHalt::new(&name, &error));
                }
            }
        }

        run.append_stage_content(kind, content)
            .map_err(|e| StageHalt::new(&name, &e))?;
        run.push_record(StageRecord::completed(&name, kind, started_at, result, decision));

        span.in_scope(|| tracing::info!(duration_ms, "Stage completed"));
        self.emit(
            PipelineEvent::new("stage.completed", run_id)
                .with_stage(&name)
                .with_data(json!({"duration_ms": duration_ms})),
        );
        Ok(())
    }

    /// Ends the run after a stage halted it.
    fn halt(&self, mut run: PipelineRun, halt: StageHalt, started: Instant) -> PipelineRun {
        let run_id = run.run_id();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        run.fail(Some(halt.stage.as_str()), &halt.reason);

        let event_type = if halt.cancelled {
            tracing::warn!(stage = %halt.stage, reason = %halt.reason, "Pipeline cancelled");
            "pipeline.cancelled"
        } else {
            tracing::error!(stage = %halt.stage, error = %halt.reason, "Pipeline failed");
            "pipeline.failed"
        };
        self.emit(
            PipelineEvent::new(event_type, run_id)
                .with_stage(&halt.stage)
                .with_data(json!({"error": halt.reason, "duration_ms": duration_ms})),
        );
        run
    }

    fn emit(&self, event: PipelineEvent) {
        self.events.emit(event);
    }
}
