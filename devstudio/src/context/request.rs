//! Inbound request that starts a pipeline run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Context;
use crate::errors::StudioError;

/// Project name used when the request does not supply one.
pub const DEFAULT_PROJECT_NAME: &str = "New Project";

/// The initiating payload for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    /// What the project should achieve.
    pub goal: String,
    /// Human-readable project name.
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Existing specification to build on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_spec: Option<String>,
    /// Extra caller-supplied context entries.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub overrides: HashMap<String, serde_json::Value>,
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// Keys the pipeline owns; overrides may not shadow them.
const RESERVED_KEYS: [&str; 7] = [
    "goal",
    "project_name",
    "current_spec",
    "design",
    "spec",
    "infra",
    "code",
];

impl InboundRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(goal: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            project_name: project_name.into(),
            current_spec: None,
            overrides: HashMap::new(),
        }
    }

    /// Sets the current specification.
    #[must_use]
    pub fn with_current_spec(mut self, spec: impl Into<String>) -> Self {
        self.current_spec = Some(spec.into());
        self
    }

    /// Adds a caller-supplied context entry.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.overrides.insert(key.into(), value);
        self
    }

    /// Checks that the request can start a run.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a blank goal or an override that shadows
    /// a pipeline-owned key.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.goal.trim().is_empty() {
            return Err(StudioError::InvalidRequest("goal must not be empty".to_string()));
        }
        if let Some(key) = self
            .overrides
            .keys()
            .find(|k| RESERVED_KEYS.contains(&k.as_str()))
        {
            return Err(StudioError::InvalidRequest(format!(
                "override '{key}' shadows a reserved context key"
            )));
        }
        Ok(())
    }

    /// Returns the project name, falling back to the default when blank.
    #[must_use]
    pub fn effective_project_name(&self) -> &str {
        let trimmed = self.project_name.trim();
        if trimmed.is_empty() {
            DEFAULT_PROJECT_NAME
        } else {
            trimmed
        }
    }

    /// Builds the initial run context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if validation fails.
    pub fn into_context(self) -> Result<Context, StudioError> {
        self.validate()?;

        let mut ctx = Context::new();
        ctx.insert("project_name", serde_json::json!(self.effective_project_name()))?;
        ctx.insert("goal", serde_json::Value::String(self.goal))?;
        if let Some(spec) = self.current_spec {
            ctx.insert("current_spec", serde_json::Value::String(spec))?;
        }
        ctx.extend(self.overrides)?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_into_context() {
        let ctx = InboundRequest::new("Build a simple todo list app", "TodoApp")
            .with_current_spec("v0")
            .with_override("audience", json!("students"))
            .into_context()
            .unwrap();

        assert_eq!(ctx.get_str("goal"), Some("Build a simple todo list app"));
        assert_eq!(ctx.get_str("project_name"), Some("TodoApp"));
        assert_eq!(ctx.get_str("current_spec"), Some("v0"));
        assert_eq!(ctx.get_str("audience"), Some("students"));
        assert_eq!(ctx.len(), 4);
    }

    #[test]
    fn test_blank_goal_rejected() {
        let err = InboundRequest::new("   ", "TodoApp").validate().unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
    }

    #[test]
    fn test_reserved_override_rejected() {
        let err = InboundRequest::new("goal", "P")
            .with_override("design", json!({}))
            .into_context()
            .unwrap_err();
        assert!(err.to_string().contains("design"));
    }

    #[test]
    fn test_default_project_name() {
        let request: InboundRequest = serde_json::from_value(json!({"goal": "g"})).unwrap();
        assert_eq!(request.project_name, DEFAULT_PROJECT_NAME);

        let blank = InboundRequest::new("g", "  ");
        assert_eq!(blank.effective_project_name(), DEFAULT_PROJECT_NAME);
    }
}
