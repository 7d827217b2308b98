//! Human-in-the-loop approval.
//!
//! This module provides:
//! - Approval requests and decisions
//! - The [`ApprovalNotifier`] transport boundary with in-process and terminal
//!   implementations
//! - The [`ApprovalGate`] that applies timeout and cancellation semantics

mod decision;
mod gate;
mod notifier;
mod terminal;

pub use decision::{ApprovalDecision, ApprovalRequest};
pub use gate::ApprovalGate;
pub use notifier::{ApprovalNotifier, AutoApprove, ChannelNotifier, NotifierError};
pub use terminal::TerminalNotifier;
