//! Shape validation for idea-generator output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::errors::StudioError;

/// One feature proposed by the idea generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureIdea {
    /// Feature name.
    pub name: String,
    /// What the feature does.
    pub description: String,
    /// Why it matters.
    pub value_prop: String,
}

/// The payload the idea generator must return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureIdeas {
    /// Proposed features.
    pub feature_ideas: Vec<FeatureIdea>,
}

#[allow(clippy::expect_used)]
fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$")
            .expect("code fence pattern is valid")
    })
}

/// Parses generator output into feature ideas.
///
/// Models often wrap JSON in a Markdown code fence; a single surrounding
/// fence is stripped before parsing.
///
/// # Errors
///
/// Returns `MalformedResponse` if the text is not
/// `{"feature_ideas": [{"name", "description", "value_prop"}, ...]}`.
pub fn parse_feature_ideas(raw: &str) -> Result<Vec<FeatureIdea>, StudioError> {
    let body = code_fence()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw, |m| m.as_str());

    serde_json::from_str::<FeatureIdeas>(body.trim())
        .map(|ideas| ideas.feature_ideas)
        .map_err(|e| {
            StudioError::MalformedResponse(format!("expected feature_ideas payload: {e}"))
        })
}
