//! Event sink system for observability.
//!
//! Pipelines report every lifecycle transition (stage start/finish, approval
//! requests and decisions, run outcome) to an [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
