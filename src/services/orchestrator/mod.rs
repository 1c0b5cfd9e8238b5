//! Response Orchestration
//!
//! Decides which bots respond to an incoming message, in what order and
//! concurrency pattern, and with what pacing; drives each response through
//! the pipeline and completion provider.

pub mod branching;
pub mod service;

pub use branching::BranchSelector;
pub use service::{ResponseOrchestrator, RoundRequest};
