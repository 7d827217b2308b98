//! Testing utilities for studio pipelines.
//!
//! This module provides:
//! - Scripted idea generators and approval notifiers
//! - A counting stage wrapper
//! - Fixtures and a ready-made pipeline harness
//! - Assertions over outputs and context growth

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_append_only, assert_complete, assert_failed_at, assert_run_extends};
pub use fixtures::{fast_retry, todo_request, StudioHarness, THREE_FEATURE_RESPONSE};
pub use mocks::{CountingStage, ScriptedNotifier, StubIdeaGenerator};
