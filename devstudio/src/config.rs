//! Studio configuration loaded from a JSON file and the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::StudioError;
use crate::ideas::GeminiConfig;
use crate::pipeline::RetryConfig;

/// API key for the idea generator.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// Model name override.
pub const ENV_MODEL: &str = "DEVSTUDIO_MODEL";
/// Retry attempts override.
pub const ENV_MAX_ATTEMPTS: &str = "DEVSTUDIO_MAX_ATTEMPTS";
/// Base backoff override, in milliseconds.
pub const ENV_BASE_DELAY_MS: &str = "DEVSTUDIO_BASE_DELAY_MS";
/// Backoff cap override, in milliseconds.
pub const ENV_MAX_DELAY_MS: &str = "DEVSTUDIO_MAX_DELAY_MS";
/// Per-attempt timeout override, in milliseconds.
pub const ENV_CALL_TIMEOUT_MS: &str = "DEVSTUDIO_CALL_TIMEOUT_MS";
/// Approval window override, in seconds.
pub const ENV_APPROVAL_TIMEOUT_SECS: &str = "DEVSTUDIO_APPROVAL_TIMEOUT_SECS";
/// Auto-approve switch.
pub const ENV_AUTO_APPROVE: &str = "DEVSTUDIO_AUTO_APPROVE";

/// Approval gate settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Decision window in seconds. No window when absent.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    /// Approve every request without asking.
    #[serde(default)]
    pub auto_approve: bool,
}

impl ApprovalConfig {
    /// Gets the decision window as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .filter(|d| !d.is_zero())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Idea generator connection.
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Retry policy for idea generation.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Approval gate.
    #[serde(default)]
    pub approval: ApprovalConfig,
}

impl StudioConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON configuration file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Serialization` if it is
    /// not valid JSON for this shape.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StudioError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unparseable value.
    pub fn from_env() -> Result<Self, StudioError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unparseable value.
    pub fn apply_env(&mut self) -> Result<(), StudioError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by the `ENV_*` names.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), StudioError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.gemini.model = model;
        }
        if let Some(v) = get(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse(ENV_MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = get(ENV_BASE_DELAY_MS) {
            self.retry.base_delay_ms = parse(ENV_BASE_DELAY_MS, &v)?;
        }
        if let Some(v) = get(ENV_MAX_DELAY_MS) {
            self.retry.max_delay_ms = parse(ENV_MAX_DELAY_MS, &v)?;
        }
        if let Some(v) = get(ENV_CALL_TIMEOUT_MS) {
            self.retry.call_timeout_ms = Some(parse(ENV_CALL_TIMEOUT_MS, &v)?);
        }
        if let Some(v) = get(ENV_APPROVAL_TIMEOUT_SECS) {
            self.approval.timeout_seconds = Some(parse(ENV_APPROVAL_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = get(ENV_AUTO_APPROVE) {
            self.approval.auto_approve = parse_bool(ENV_AUTO_APPROVE, &v)?;
        }
        Ok(())
    }

    /// Checks the configuration for values the pipeline cannot honour.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid field.
    pub fn validate(&self) -> Result<(), StudioError> {
        self.retry.validate()?;
        if let Some(secs) = self.approval.timeout_seconds {
            positive_seconds("approval timeout", secs)?;
        }
        positive_seconds("gemini timeout", self.gemini.timeout_seconds)?;
        Ok(())
    }
}

/// Accepts only values that convert to a non-zero `Duration`.
fn positive_seconds(field: &str, secs: f64) -> Result<Duration, StudioError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(window) if !window.is_zero() => Ok(window),
        _ => Err(StudioError::Config(format!(
            "{field} must be a positive number of seconds, got {secs}"
        ))),
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, StudioError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| StudioError::Config(format!("{key}={value:?}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, StudioError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(StudioError::Config(format!(
            "{key}={value:?}: expected a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(4));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(10));
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!(config.approval.timeout().is_none());
        assert!(!config.approval.auto_approve);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"retry": {{"max_attempts": 5}}, "approval": {{"timeout_seconds": 30}}}}"#
        )
        .unwrap();

        let config = StudioConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 4000);
        assert_eq!(config.approval.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_from_file_errors() {
        let err = StudioConfig::from_file("/nonexistent/devstudio.json").unwrap_err();
        assert!(matches!(err, StudioError::Io(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = StudioConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, StudioError::Serialization(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = StudioConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_API_KEY, "k"),
                (ENV_MODEL, "gemini-pro"),
                (ENV_MAX_ATTEMPTS, "4"),
                (ENV_BASE_DELAY_MS, "100"),
                (ENV_MAX_DELAY_MS, "800"),
                (ENV_CALL_TIMEOUT_MS, "2000"),
                (ENV_APPROVAL_TIMEOUT_SECS, "60"),
                (ENV_AUTO_APPROVE, "yes"),
            ]))
            .unwrap();

        assert_eq!(config.gemini.api_key.as_deref(), Some("k"));
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.backoff_schedule().len(), 3);
        assert_eq!(config.retry.call_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.approval.timeout(), Some(Duration::from_secs(60)));
        assert!(config.approval.auto_approve);
        config.validate().unwrap();
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let mut config = StudioConfig::default();
        config
            .apply_overrides(lookup(&[(ENV_MODEL, "  "), (ENV_API_KEY, "")]))
            .unwrap();
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = StudioConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_MAX_ATTEMPTS, "three")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ATTEMPTS));

        let err = config
            .apply_overrides(lookup(&[(ENV_AUTO_APPROVE, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StudioConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.approval.timeout_seconds = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_approval_timeout_rejected() {
        let mut config = StudioConfig::default();
        config
            .apply_overrides(lookup(&[(ENV_APPROVAL_TIMEOUT_SECS, "1e20")]))
            .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("approval timeout"));
        assert!(config.approval.timeout().is_none());
    }

    #[test]
    fn test_oversized_gemini_timeout_rejected() {
        let mut config = StudioConfig::default();
        config.gemini.timeout_seconds = 1e20;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, StudioError::Config(ref msg) if msg.contains("gemini timeout")));
        assert_eq!(config.gemini.timeout(), Duration::MAX);
    }
}
