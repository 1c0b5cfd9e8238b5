//! Completion Provider Trait
//!
//! Defines the common interface the orchestration engine uses to obtain a
//! bot's reply. The engine treats a provider as an opaque, possibly
//! streaming, possibly failing async operation; concrete wire protocols
//! live behind this seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{CompletionOptions, CompletionResponse, LlmResult};
use chorus_core::Message;

/// Trait that all completion providers must implement.
///
/// A provider receives the system prompt, the (already filtered)
/// conversation history, and per-call options, and returns the final
/// assembled response. When a chunk channel is supplied, providers that
/// stream should forward text chunks through it as they arrive; the final
/// response still carries the full concatenated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the provider name for logging and identification.
    fn name(&self) -> &'static str;

    /// Generate a completion.
    ///
    /// # Arguments
    /// * `system_prompt` - The bot's system prompt
    /// * `history` - Conversation history visible to this bot
    /// * `options` - Model identifier and sampling parameters
    /// * `chunk_tx` - Optional channel for streamed text chunks
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[Message],
        options: &CompletionOptions,
        chunk_tx: Option<mpsc::Sender<String>>,
    ) -> LlmResult<CompletionResponse>;

    /// Check if the provider is healthy and reachable.
    ///
    /// Default implementation assumes health; network-backed providers
    /// should override to validate credentials/connectivity.
    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}
