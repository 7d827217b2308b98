//! Context management for pipeline execution.
//!
//! This module provides:
//! - The append-only run context
//! - Run identities
//! - The inbound request that seeds a context
//! - The read-only view handed to each stage

mod bags;
mod identity;
mod request;
mod stage;

pub use bags::Context;
pub use identity::RunIdentity;
pub use request::{InboundRequest, DEFAULT_PROJECT_NAME};
pub use stage::StageContext;
