//! Append-only run context.

use crate::errors::{DataConflictError, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accumulating key/value state threaded through a pipeline run.
///
/// Keys can only be added. Writing to an existing key raises a
/// `DataConflictError`, and there is no removal API, so every value written
/// by an earlier stage is visible unchanged to all later stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from existing data.
    #[must_use]
    pub fn from_data(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// Gets a value from the context.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string value, treating non-strings as absent.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }

    /// Gets a value that a stage cannot run without.
    ///
    /// # Errors
    ///
    /// Returns `StageFailure` naming `stage` if the key is missing or null.
    pub fn require(&self, stage: &str, key: &str) -> Result<&serde_json::Value, StudioError> {
        match self.data.get(key) {
            Some(serde_json::Value::Null) | None => Err(StudioError::stage(
                stage,
                format!("missing required input '{key}'"),
            )),
            Some(value) => Ok(value),
        }
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Appends a value.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` if the key already exists.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), DataConflictError> {
        let key = key.into();
        if self.data.contains_key(&key) {
            return Err(DataConflictError::new(key));
        }
        self.data.insert(key, value);
        Ok(())
    }

    /// Appends every entry of `other`, failing on the first conflicting key.
    ///
    /// Nothing is written when a conflict is found.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` for the first key already present.
    pub fn extend(
        &mut self,
        other: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Result<(), DataConflictError> {
        let entries: Vec<_> = other.into_iter().collect();
        if let Some((key, _)) = entries.iter().find(|(k, _)| self.data.contains_key(k)) {
            return Err(DataConflictError::new(key.clone()));
        }
        self.data.extend(entries);
        Ok(())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns all keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = Context::new();
        ctx.insert("goal", json!("Build a todo app")).unwrap();

        assert_eq!(ctx.get_str("goal"), Some("Build a todo app"));
        assert!(ctx.contains_key("goal"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_insert_conflict_keeps_original() {
        let mut ctx = Context::new();
        ctx.insert("design", json!({"v": 1})).unwrap();

        let err = ctx.insert("design", json!({"v": 2})).unwrap_err();
        assert_eq!(err.key, "design");
        assert_eq!(ctx.get("design"), Some(&json!({"v": 1})));
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut ctx = Context::new();
        ctx.insert("goal", json!("g")).unwrap();

        let err = ctx
            .extend(vec![
                ("project_name".to_string(), json!("P")),
                ("goal".to_string(), json!("other")),
            ])
            .unwrap_err();

        assert_eq!(err.key, "goal");
        assert!(!ctx.contains_key("project_name"));
        assert_eq!(ctx.get_str("goal"), Some("g"));
    }

    #[test]
    fn test_require() {
        let mut ctx = Context::new();
        ctx.insert("spec", json!({"features": []})).unwrap();
        ctx.insert("infra", serde_json::Value::Null).unwrap();

        assert!(ctx.require("code_generation", "spec").is_ok());

        let err = ctx.require("code_generation", "infra").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Stage 'code_generation' failed: missing required input 'infra'"
        );
        assert!(ctx.require("code_generation", "absent").is_err());
    }

    #[test]
    fn test_get_str_non_string() {
        let mut ctx = Context::new();
        ctx.insert("count", json!(3)).unwrap();
        assert!(ctx.get_str("count").is_none());
    }

    #[test]
    fn test_keys_sorted() {
        let mut ctx = Context::new();
        ctx.insert("b", json!(1)).unwrap();
        ctx.insert("a", json!(2)).unwrap();
        assert_eq!(ctx.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut ctx = Context::new();
        ctx.insert("goal", json!("g")).unwrap();
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"goal": "g"}));
    }
}
