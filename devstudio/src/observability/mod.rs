//! Observability utilities.
//!
//! Structured logging goes through `tracing`; the pipeline opens one span per
//! run and one per stage. [`init_tracing`] installs a `tracing-subscriber`
//! pipeline for binaries, and [`wide_events`] builds one-line run summaries.

mod subscriber;
pub mod wide_events;

pub use subscriber::{init_tracing, LogFormat, DEFAULT_LOG_DIRECTIVE};
pub use wide_events::{run_summary, stage_summary};
