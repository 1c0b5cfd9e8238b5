//! Engine Services
//!
//! The four cooperating components of the orchestration engine:
//! event bus, deduplication cache, message pipeline, response orchestrator.

pub mod dedup;
pub mod events;
pub mod orchestrator;
pub mod pipeline;
