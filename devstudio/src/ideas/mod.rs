//! Idea-generation collaborator.
//!
//! The design stage asks an external text-generation model for feature ideas.
//! This module defines that boundary ([`IdeaGenerator`]), the prompt it is
//! sent, the shape its answer must have, and, behind the `gemini` feature, an
//! HTTP client for Gemini-compatible endpoints.

mod config;
#[cfg(feature = "gemini")]
mod gemini;
mod parse;
mod prompt;

pub use config::GeminiConfig;
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
pub use parse::{parse_feature_ideas, FeatureIdea, FeatureIdeas};
pub use prompt::build_prompt;

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to the idea-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Request(String),
    /// The service answered with a non-success status.
    #[error("model returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The service answered without any text.
    #[error("model returned no text")]
    EmptyResponse,
    /// No API key was configured.
    #[error("no API key configured for the idea generator")]
    MissingApiKey,
}

/// A text-generation service invoked with a prompt string.
///
/// The returned text is untrusted; callers validate its shape with
/// [`parse_feature_ideas`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    /// Generates text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
