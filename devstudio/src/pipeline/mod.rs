//! Pipeline building and execution.
//!
//! This module provides:
//! - Bounded retry around external calls
//! - The pipeline builder with validation
//! - The orchestration engine and per-run state
//! - The aggregated final output

mod builder;
mod engine;
mod output;
mod retry;
mod run;


pub use builder::PipelineBuilder;
pub use engine::Pipeline;
pub use output::{FinalOutput, OutputStatus};
pub use retry::{with_retry, JitterStrategy, RetryConfig, RetryableCall};
pub use run::{PipelineRun, SPEC_KEY};
