//! HTTP client for Gemini-compatible `generateContent` endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GeminiConfig, GenerationError, IdeaGenerator};

/// Longest error body kept in a `GenerationError::Status`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Idea generator backed by a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if no key is configured, or `Request` if the
    /// HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl IdeaGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling generateContent");

        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        parsed.into_text().ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_api_key() {
        let err = GeminiClient::new(GeminiConfig::default()).unwrap_err();
        assert_eq!(err, GenerationError::MissingApiKey);

        let err = GeminiClient::new(GeminiConfig::default().with_api_key("  ")).unwrap_err();
        assert_eq!(err, GenerationError::MissingApiKey);
    }

    #[test]
    fn test_client_builds_with_key() {
        let client = GeminiClient::new(GeminiConfig::default().with_api_key("k")).unwrap();
        assert_eq!(client.config().model, "gemini-2.5-flash");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"feature_ideas\":"}, {"text": "[]}"}]}}]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("{\"feature_ideas\":[]}"));

        let empty: GenerateResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(empty.into_text().is_none());

        let blocked: GenerateResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert!(blocked.into_text().is_none());
    }
}
