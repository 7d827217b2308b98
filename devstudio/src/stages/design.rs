//! Design stage: turns a project goal into a feature specification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::Stage;
use crate::context::{StageContext, DEFAULT_PROJECT_NAME};
use crate::core::{StageKind, StageResult};
use crate::errors::StudioError;
use crate::ideas::{build_prompt, parse_feature_ideas, IdeaGenerator};
use crate::pipeline::{RetryConfig, RetryableCall};

/// Call-site name used for retries and logs.
const IDEA_CALL: &str = "idea_generator";

/// Technology choices recorded in the design spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalRequirements {
    /// Frontend technology.
    pub frontend: String,
    /// Backend technology.
    pub backend: String,
    /// Database technology.
    pub database: String,
}

impl Default for TechnicalRequirements {
    fn default() -> Self {
        Self {
            frontend: "Single-file HTML/JS/CSS with Tailwind".to_string(),
            backend: "Google Cloud Run (if needed)".to_string(),
            database: "Firestore (if needed)".to_string(),
        }
    }
}

/// Asks the idea generator for features and assembles the design spec.
///
/// Reads `goal` (required) and `current_spec` (optional). Produces
/// `{ project_name, features, technical_requirements }`.
#[derive(Clone)]
pub struct DesignStage {
    generator: Arc<dyn IdeaGenerator>,
    retry: RetryConfig,
    requirements: TechnicalRequirements,
}

impl DesignStage {
    /// Creates a design stage with the default retry policy.
    #[must_use]
    pub fn new(generator: Arc<dyn IdeaGenerator>) -> Self {
        Self {
            generator,
            retry: RetryConfig::default(),
            requirements: TechnicalRequirements::default(),
        }
    }

    /// Sets the retry policy for generator calls.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the technical requirements recorded in the spec.
    #[must_use]
    pub fn with_requirements(mut self, requirements: TechnicalRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    async fn design(&self, ctx: &StageContext) -> Result<serde_json::Value, StudioError> {
        let goal = ctx
            .require("goal")?
            .as_str()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| StudioError::stage(ctx.stage_name(), "goal must be a non-empty string"))?;
        let project_name = ctx.get_str("project_name").unwrap_or(DEFAULT_PROJECT_NAME);
        let prompt = build_prompt(goal, ctx.get_str("current_spec"));

        let call = RetryableCall::new(IDEA_CALL, self.retry.clone())
            .with_cancellation(ctx.cancel_token());
        let raw = call
            .call(|| {
                let generator = Arc::clone(&self.generator);
                let prompt = prompt.clone();
                async move { generator.generate(&prompt).await }
            })
            .await
            .map_err(|e| e.into_studio_error(IDEA_CALL))?;

        let features = parse_feature_ideas(&raw)?;
        tracing::debug!(
            run_id = %ctx.run_id(),
            features = features.len(),
            "Design spec assembled"
        );

        Ok(json!({
            "project_name": project_name,
            "features": features,
            "technical_requirements": self.requirements,
        }))
    }
}

impl std::fmt::Debug for DesignStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignStage")
            .field("retry", &self.retry)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for DesignStage {
    fn name(&self) -> &str {
        "design"
    }

    fn kind(&self) -> StageKind {
        StageKind::Design
    }

    async fn execute(&self, ctx: &StageContext) -> StageResult {
        self.design(ctx).await.into()
    }
}
