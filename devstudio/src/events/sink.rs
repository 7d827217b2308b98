//! Event sink trait and implementations.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};
use uuid::Uuid;

/// A lifecycle event emitted by a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Event type, e.g. `stage.started`.
    pub event_type: String,
    /// Run the event belongs to.
    pub run_id: Uuid,
    /// Stage the event concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Event payload.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    /// Creates a run-level event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            event_type: event_type.into(),
            run_id,
            stage: None,
            data: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Sets the stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Receives pipeline lifecycle events.
///
/// `emit` must never fail or block for long; sinks that forward to slow
/// backends should buffer internally.
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Records one event.
    fn emit(&self, event: PipelineEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: PipelineEvent) {
        let stage = event.stage.as_deref().unwrap_or("-");
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event.event_type,
                run_id = %event.run_id,
                stage,
                event_data = %event.data,
                "Event: {}", event.event_type
            );
        } else {
            info!(
                event_type = %event.event_type,
                run_id = %event.run_id,
                stage,
                event_data = %event.data,
                "Event: {}", event.event_type
            );
        }
    }
}

/// A collecting event sink for tests and in-process inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns events belonging to one run.
    #[must_use]
    pub fn events_for_run(&self, run_id: Uuid) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_noop_sink() {
        NoOpEventSink.emit(PipelineEvent::new("test", Uuid::new_v4()));
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(
            PipelineEvent::new("stage.started", Uuid::new_v4())
                .with_stage("design")
                .with_data(json!({"key": "value"})),
        );
        LoggingEventSink::debug().emit(PipelineEvent::new("pipeline.started", Uuid::new_v4()));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        let run_id = Uuid::new_v4();
        sink.emit(PipelineEvent::new("stage.started", run_id).with_stage("design"));
        sink.emit(PipelineEvent::new("stage.completed", run_id).with_stage("design"));
        sink.emit(PipelineEvent::new("approval.requested", Uuid::new_v4()));

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events_for_run(run_id).len(), 2);
        assert_eq!(
            sink.event_types(),
            vec!["stage.started", "stage.completed", "approval.requested"]
        );
    }

    #[test]
    fn test_event_serialization_skips_empty_fields() {
        let run_id = Uuid::new_v4();
        let value = serde_json::to_value(PipelineEvent::new("pipeline.started", run_id)).unwrap();
        assert!(value.get("stage").is_none());
        assert!(value.get("data").is_none());
        assert_eq!(value["run_id"], json!(run_id.to_string()));
    }
}
