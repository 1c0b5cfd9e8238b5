//! Engine Models
//!
//! Data structures consumed and produced by the orchestration engine:
//! bot personas, chat configuration, and per-round outcomes. Conversation
//! message types live in `chorus-core` so the LLM crate can share them.

pub mod bot;
pub mod chat_config;
pub mod round;

pub use bot::Bot;
pub use chat_config::{ChatConfig, InputConsideration, ResponseOrdering};
pub use round::{BotOutcome, ErrorKind, OrchestrationRound, RoundStatus};
