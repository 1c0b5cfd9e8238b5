//! Bot Models
//!
//! Data structures for configured AI companions. Bots are read-only
//! configuration to the engine; their lifecycle (create/edit/delete) is
//! owned by the host application.

use serde::{Deserialize, Serialize};

/// A configured AI companion participating in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    /// Unique identifier (UUID)
    pub id: String,
    /// Display name for the bot
    pub name: String,
    /// System prompt that defines the bot's persona
    pub system_prompt: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-bot response delay bounds in milliseconds; overrides the
    /// chat-level jitter bounds when set
    pub response_delay_range: Option<(u64, u64)>,
    /// Whether the bot participates in orchestration rounds
    pub enabled: bool,
}

impl Bot {
    /// Create a new bot with required fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            model: model.into(),
            temperature: 0.7,
            response_delay_range: None,
            enabled: true,
        }
    }

    /// Create a new bot with a generated UUID.
    pub fn create(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), name, system_prompt, model)
    }

    /// Builder pattern: set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder pattern: set per-bot response delay bounds (milliseconds)
    pub fn with_response_delay_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.response_delay_range = Some((min_ms, max_ms));
        self
    }

    /// Builder pattern: set enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
