//! # Devstudio
//!
//! A staged pipeline that turns a project goal into a design spec, an
//! infrastructure plan and a single-file web application.
//!
//! The engine provides:
//!
//! - **Fixed stage order**: design, infrastructure, code generation
//! - **Append-only context**: each stage sees everything earlier stages produced
//! - **Bounded retry**: exponential backoff around the idea generator
//! - **Approval gates**: a stage can hold the run until a human decides
//! - **Cancellation**: cooperative, observed at every suspension point
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use devstudio::prelude::*;
//!
//! let generator = Arc::new(GeminiClient::new(GeminiConfig::new().with_api_key(key))?);
//! let pipeline = PipelineBuilder::studio(generator, RetryConfig::default())
//!     .approval_gate(ApprovalGate::auto_approve())
//!     .build()?;
//!
//! let output = pipeline
//!     .run(InboundRequest::new("Build a simple todo list app", "TodoApp"))
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&output)?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod approval;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod ideas;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::approval::{
        ApprovalDecision, ApprovalGate, ApprovalNotifier, ApprovalRequest, AutoApprove,
        ChannelNotifier, TerminalNotifier,
    };
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::StudioConfig;
    pub use crate::context::{Context, InboundRequest, RunIdentity, StageContext};
    pub use crate::core::{RunStatus, StageKind, StageRecord, StageResult};
    pub use crate::errors::{DataConflictError, RetryError, StudioError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    #[cfg(feature = "gemini")]
    pub use crate::ideas::GeminiClient;
    pub use crate::ideas::{GeminiConfig, IdeaGenerator};
    pub use crate::pipeline::{
        FinalOutput, OutputStatus, Pipeline, PipelineBuilder, PipelineRun, RetryConfig,
        RetryableCall,
    };
    pub use crate::stages::{
        CodeGenerationStage, DesignStage, FnStage, InfrastructureStage, Stage,
    };
    pub use std::sync::Arc;
}
