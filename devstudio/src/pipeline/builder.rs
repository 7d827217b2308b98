//! Pipeline builder with validation.

use std::sync::Arc;

use super::{Pipeline, RetryConfig};
use crate::approval::ApprovalGate;
use crate::core::StageKind;
use crate::errors::StudioError;
use crate::events::{EventSink, NoOpEventSink};
use crate::ideas::IdeaGenerator;
use crate::stages::{CodeGenerationStage, DesignStage, InfrastructureStage, Stage};

/// Builder for creating validated pipelines.
///
/// Each stage fills the slot named by its [`StageKind`]; the order of the
/// calls does not matter, the pipeline always runs design, infrastructure,
/// then code generation.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    design: Option<Arc<dyn Stage>>,
    infrastructure: Option<Arc<dyn Stage>>,
    code_generation: Option<Arc<dyn Stage>>,
    gate: ApprovalGate,
    events: Option<Arc<dyn EventSink>>,
}

impl PipelineBuilder {
    /// Creates an empty builder with an auto-approving gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the standard studio stages.
    #[must_use]
    pub fn studio(generator: Arc<dyn IdeaGenerator>, retry: RetryConfig) -> Self {
        Self::new()
            .stage(Arc::new(DesignStage::new(generator).with_retry(retry)))
            .stage(Arc::new(InfrastructureStage::new()))
            .stage(Arc::new(CodeGenerationStage::new()))
    }

    /// Places a stage in the slot for its kind, replacing any previous one.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        let slot = match stage.kind() {
            StageKind::Design => &mut self.design,
            StageKind::Infrastructure => &mut self.infrastructure,
            StageKind::CodeGeneration => &mut self.code_generation,
        };
        *slot = Some(stage);
        self
    }

    /// Sets the approval gate.
    #[must_use]
    pub fn approval_gate(mut self, gate: ApprovalGate) -> Self {
        self.gate = gate;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `Config` if any stage slot is empty.
    pub fn build(self) -> Result<Pipeline, StudioError> {
        let missing: Vec<String> = [
            (StageKind::Design, self.design.is_none()),
            (StageKind::Infrastructure, self.infrastructure.is_none()),
            (StageKind::CodeGeneration, self.code_generation.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(kind, _)| kind.to_string())
        .collect();

        match (self.design, self.infrastructure, self.code_generation) {
            (Some(design), Some(infrastructure), Some(code_generation)) => Ok(Pipeline::from_parts(
                [design, infrastructure, code_generation],
                self.gate,
                self.events.unwrap_or_else(|| Arc::new(NoOpEventSink)),
            )),
            _ => Err(StudioError::Config(format!(
                "pipeline is missing stage(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageResult;
    use crate::context::StageContext;
    use crate::stages::FnStage;

    fn stub(kind: StageKind) -> Arc<dyn Stage> {
        Arc::new(FnStage::new(kind, |_ctx: StageContext| async {
            StageResult::success(serde_json::json!({}))
        }))
    }

    #[test]
    fn test_missing_stages() {
        let err = PipelineBuilder::new()
            .stage(stub(StageKind::Design))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: pipeline is missing stage(s): infrastructure, code_generation"
        );
    }

    #[test]
    fn test_build_orders_by_kind() {
        let pipeline = PipelineBuilder::new()
            .stage(stub(StageKind::CodeGeneration))
            .stage(stub(StageKind::Design))
            .stage(stub(StageKind::Infrastructure))
            .build()
            .unwrap();

        let names: Vec<&str> = pipeline.stages().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["design", "infrastructure", "code_generation"]);
        assert!(pipeline.gate().timeout().is_none());
    }

    #[test]
    fn test_later_stage_replaces_slot() {
        let replacement = Arc::new(
            FnStage::new(StageKind::Design, |_ctx: StageContext| async {
                StageResult::failure("replaced")
            })
            .named("custom_design"),
        );
        let pipeline = PipelineBuilder::new()
            .stage(stub(StageKind::Design))
            .stage(replacement)
            .stage(stub(StageKind::Infrastructure))
            .stage(stub(StageKind::CodeGeneration))
            .build()
            .unwrap();
        assert_eq!(pipeline.stages()[0].name(), "custom_design");
    }
}
