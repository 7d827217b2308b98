//! Fixtures for pipeline tests.

use std::sync::Arc;
use std::time::Duration;

use super::{CountingStage, StubIdeaGenerator};
use crate::approval::ApprovalGate;
use crate::context::InboundRequest;
use crate::events::EventSink;
use crate::pipeline::{Pipeline, RetryConfig};
use crate::stages::{CodeGenerationStage, DesignStage, InfrastructureStage};

/// A well-formed idea-generator response with three features.
pub const THREE_FEATURE_RESPONSE: &str = r#"{"feature_ideas": [
    {"name": "Due Dates", "description": "Attach a deadline to each task", "value_prop": "Keeps users focused"},
    {"name": "Tags", "description": "Label and filter tasks", "value_prop": "Organises large lists"},
    {"name": "Shared Lists", "description": "Invite others to a list", "value_prop": "Enables collaboration"}
]}"#;

/// The canonical todo-app request.
#[must_use]
pub fn todo_request() -> InboundRequest {
    InboundRequest::new("Build a simple todo list app", "TodoApp")
}

/// A retry policy with millisecond backoff.
#[must_use]
pub fn fast_retry() -> RetryConfig {
    RetryConfig::new()
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

/// A studio pipeline whose stages are wrapped in counters.
#[derive(Debug, Clone)]
pub struct StudioHarness {
    /// The pipeline under test.
    pub pipeline: Pipeline,
    /// The idea generator behind the design stage.
    pub generator: Arc<StubIdeaGenerator>,
    /// Design stage counter.
    pub design: Arc<CountingStage>,
    /// Infrastructure stage counter.
    pub infrastructure: Arc<CountingStage>,
    /// Code generation stage counter.
    pub code_generation: Arc<CountingStage>,
}

impl StudioHarness {
    /// Builds a harness around `generator`, `gate` and `events`.
    ///
    /// # Panics
    ///
    /// Never in practice; every stage slot is filled.
    #[must_use]
    pub fn new(
        generator: StubIdeaGenerator,
        gate: ApprovalGate,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let generator = Arc::new(generator);
        let design = Arc::new(CountingStage::new(Arc::new(
            DesignStage::new(Arc::clone(&generator) as Arc<dyn crate::ideas::IdeaGenerator>)
                .with_retry(fast_retry()),
        )));
        let infrastructure = Arc::new(CountingStage::new(Arc::new(InfrastructureStage::new())));
        let code_generation = Arc::new(CountingStage::new(Arc::new(CodeGenerationStage::new())));

        #[allow(clippy::expect_used)]
        let pipeline = Pipeline::builder()
            .stage(Arc::clone(&design) as Arc<dyn crate::stages::Stage>)
            .stage(Arc::clone(&infrastructure) as Arc<dyn crate::stages::Stage>)
            .stage(Arc::clone(&code_generation) as Arc<dyn crate::stages::Stage>)
            .approval_gate(gate)
            .events(events)
            .build()
            .expect("all stage slots are filled");

        Self {
            pipeline,
            generator,
            design,
            infrastructure,
            code_generation,
        }
    }

    /// Builds a harness that answers with [`THREE_FEATURE_RESPONSE`] and
    /// auto-approves.
    #[must_use]
    pub fn happy_path(events: Arc<dyn EventSink>) -> Self {
        Self::new(
            StubIdeaGenerator::always(THREE_FEATURE_RESPONSE),
            ApprovalGate::auto_approve(),
            events,
        )
    }

    /// Returns (design, infrastructure, code generation) call counts.
    #[must_use]
    pub fn call_counts(&self) -> (usize, usize, usize) {
        (
            self.design.call_count(),
            self.infrastructure.call_count(),
            self.code_generation.call_count(),
        )
    }
}
