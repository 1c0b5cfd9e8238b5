//! Chorus Core
//!
//! Foundational message types for the Chorus conversation orchestration
//! workspace, shared by the engine and the LLM provider crate. This crate
//! has zero dependencies on engine-level code (event bus, pipeline,
//! orchestrator, LLM providers).
//!
//! ## Module Organization
//!
//! - `message` - Conversation and provider message types (`ChatMessage`, `Message`)
//!
//! ## Design Principles
//!
//! 1. **Minimal dependencies** - serde/uuid/chrono only
//! 2. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod message;

// ── Message Types ──────────────────────────────────────────────────────
pub use message::{ChatMessage, Message, Role, Sender};
