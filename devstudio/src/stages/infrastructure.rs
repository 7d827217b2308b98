//! Infrastructure stage: derives a storage and hosting plan from the design.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Stage;
use crate::context::StageContext;
use crate::core::{StageKind, StageResult};
use crate::errors::StudioError;

/// Message shown to the approver of every infrastructure plan.
pub const INFRASTRUCTURE_APPROVAL_MESSAGE: &str = "Please confirm infrastructure setup plan";

/// Database section of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePlan {
    /// Database product.
    #[serde(rename = "type")]
    pub kind: String,
    /// One collection per designed feature.
    pub collections: Vec<String>,
}

/// Sizing of the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingConfiguration {
    /// Memory limit.
    pub memory: String,
    /// CPU allocation.
    pub cpu: String,
    /// Upper bound on instances.
    pub max_instances: u32,
}

impl Default for HostingConfiguration {
    fn default() -> Self {
        Self {
            memory: "256Mi".to_string(),
            cpu: "1".to_string(),
            max_instances: 10,
        }
    }
}

/// Hosting section of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingPlan {
    /// Hosting platform.
    pub platform: String,
    /// Service sizing.
    pub configuration: HostingConfiguration,
}

/// The resource plan produced by [`InfrastructureStage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructurePlan {
    /// Storage.
    pub database: DatabasePlan,
    /// Compute.
    pub hosting: HostingPlan,
}

/// Plans storage and hosting for the designed features.
///
/// Makes no external call. Every plan requires approval.
#[derive(Debug, Clone)]
pub struct InfrastructureStage {
    database: String,
    platform: String,
    hosting: HostingConfiguration,
}

impl Default for InfrastructureStage {
    fn default() -> Self {
        Self {
            database: "Firestore".to_string(),
            platform: "Cloud Run".to_string(),
            hosting: HostingConfiguration::default(),
        }
    }
}

impl InfrastructureStage {
    /// Creates an infrastructure stage with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hosting configuration.
    #[must_use]
    pub fn with_hosting(mut self, hosting: HostingConfiguration) -> Self {
        self.hosting = hosting;
        self
    }

    /// Builds the plan for a design spec.
    ///
    /// # Errors
    ///
    /// Returns `StageFailure` if the spec has no `features` array.
    pub fn plan(&self, spec: &serde_json::Value) -> Result<InfrastructurePlan, StudioError> {
        let features = spec
            .get("features")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| StudioError::stage(self.name(), "design spec has no features list"))?;

        let mut collections: Vec<String> = Vec::with_capacity(features.len());
        for feature in features {
            let name = feature
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(collection_name)
                .unwrap_or_default();
            if !name.is_empty() && !collections.contains(&name) {
                collections.push(name);
            }
        }

        Ok(InfrastructurePlan {
            database: DatabasePlan {
                kind: self.database.clone(),
                collections,
            },
            hosting: HostingPlan {
                platform: self.platform.clone(),
                configuration: self.hosting.clone(),
            },
        })
    }
}

/// Lowercase snake_case form of a feature name.
fn collection_name(feature: &str) -> String {
    let mut out = String::with_capacity(feature.len());
    for c in feature.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[async_trait]
impl Stage for InfrastructureStage {
    fn name(&self) -> &str {
        "infrastructure"
    }

    fn kind(&self) -> StageKind {
        StageKind::Infrastructure
    }

    async fn execute(&self, ctx: &StageContext) -> StageResult {
        let plan = ctx
            .require("spec")
            .and_then(|spec| self.plan(spec))
            .and_then(|plan| serde_json::to_value(plan).map_err(StudioError::from));

        match plan {
            Ok(content) => StageResult::needs_approval(content, INFRASTRUCTURE_APPROVAL_MESSAGE),
            Err(e) => StageResult::failure(e.to_string()),
        }
    }
}
