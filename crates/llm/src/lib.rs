//! Chorus LLM
//!
//! The completion-provider seam for the Chorus conversation engine. The
//! engine consumes [`CompletionProvider`] as an opaque async operation;
//! concrete provider wire protocols (Anthropic, OpenAI, local inference,
//! ...) are implemented behind this trait by the host application.
//!
//! Includes a [`ScriptedProvider`] for tests and demos.

pub mod provider;
pub mod scripted;
pub mod types;

// Re-export main types
pub use provider::CompletionProvider;
pub use scripted::{ScriptEntry, ScriptedProvider};
pub use types::{CompletionOptions, CompletionResponse, LlmError, LlmResult, TokenUsage};
