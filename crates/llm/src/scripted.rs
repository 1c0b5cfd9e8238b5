//! Scripted Provider
//!
//! An in-memory [`CompletionProvider`] with canned per-model replies,
//! injectable failures, and optional simulated latency. Used by the engine's
//! integration tests and demos as a stand-in for a network provider.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::provider::CompletionProvider;
use super::types::{CompletionOptions, CompletionResponse, LlmError, LlmResult};
use chorus_core::Message;

/// What the scripted provider should do for a given model identifier.
#[derive(Debug, Clone)]
pub enum ScriptEntry {
    /// Return this text
    Reply(String),
    /// Fail with this error
    Fail(LlmError),
}

/// In-memory provider that replays a script keyed by model identifier.
///
/// Unknown models fall back to echoing the last user message, so simple
/// tests need no setup at all.
pub struct ScriptedProvider {
    script: Mutex<HashMap<String, ScriptEntry>>,
    /// Simulated per-call latency
    latency: Duration,
    /// Record of (model, last user content) per call, in call order
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    /// Create a provider with no script and no latency.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Builder pattern: set simulated per-call latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Script a canned reply for a model identifier.
    pub fn reply(self, model: impl Into<String>, text: impl Into<String>) -> Self {
        self.script_lock()
            .insert(model.into(), ScriptEntry::Reply(text.into()));
        self
    }

    /// Script a failure for a model identifier.
    pub fn fail(self, model: impl Into<String>, error: LlmError) -> Self {
        self.script_lock()
            .insert(model.into(), ScriptEntry::Fail(error));
        self
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls_lock().len()
    }

    /// Models called so far, in call order.
    pub fn called_models(&self) -> Vec<String> {
        self.calls_lock()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    fn script_lock(&self) -> MutexGuard<'_, HashMap<String, ScriptEntry>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn calls_lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        history: &[Message],
        options: &CompletionOptions,
        chunk_tx: Option<mpsc::Sender<String>>,
    ) -> LlmResult<CompletionResponse> {
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == chorus_core::Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        self.calls_lock()
            .push((options.model.clone(), last_user.clone()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let entry = self.script_lock().get(&options.model).cloned();

        let content = match entry {
            Some(ScriptEntry::Reply(text)) => text,
            Some(ScriptEntry::Fail(error)) => {
                tracing::debug!(model = %options.model, error = %error, "scripted failure injected");
                return Err(error);
            }
            None => format!("echo: {}", last_user),
        };

        if let Some(tx) = chunk_tx {
            // Best effort: a closed receiver is not a provider failure
            let _ = tx.send(content.clone()).await;
        }

        Ok(CompletionResponse::text(content))
    }
}
