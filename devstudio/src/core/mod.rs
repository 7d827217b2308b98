//! Core domain model types for devstudio.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage kind and run status enums
//! - The tagged stage result
//! - Per-stage history records

mod record;
mod result;
mod status;

pub use record::{RecordStatus, StageRecord};
pub use result::{ApprovalRequirement, StageResult};
pub use status::{RunStatus, StageKind};
