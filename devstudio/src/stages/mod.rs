//! Stage trait and implementations.
//!
//! Stages are the units of work the studio pipeline runs in a fixed order:
//! [`DesignStage`], [`InfrastructureStage`] and [`CodeGenerationStage`].
//! A stage reads a snapshot of the run context and returns a
//! [`StageResult`]; it never writes to the context itself.

mod codegen;
mod design;
mod infrastructure;

pub use codegen::{CodeGenerationStage, GENERATED_FILE, GENERATION_CONFIRMATION};
pub use design::{DesignStage, TechnicalRequirements};
pub use infrastructure::{
    DatabasePlan, HostingConfiguration, HostingPlan, InfrastructurePlan, InfrastructureStage,
    INFRASTRUCTURE_APPROVAL_MESSAGE,
};

use crate::context::StageContext;
use crate::core::{StageKind, StageResult};
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;

/// Trait for pipeline stages.
///
/// Implementations fold every internal error into
/// [`StageResult::Failure`]; nothing escapes `execute`.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the pipeline slot this stage fills.
    fn kind(&self) -> StageKind;

    /// Executes the stage against a read-only context snapshot.
    async fn execute(&self, ctx: &StageContext) -> StageResult;
}

/// A stage backed by an async closure.
pub struct FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    name: String,
    kind: StageKind,
    func: F,
    _phantom: std::marker::PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    /// Creates a new function-based stage named after its kind.
    pub fn new(kind: StageKind, func: F) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            func,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Overrides the stage name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, Fut> Debug for FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Stage for FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn execute(&self, ctx: &StageContext) -> StageResult {
        (self.func)(ctx.clone()).await
    }
}
