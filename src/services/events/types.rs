//! Typed Chat Events
//!
//! The tagged event enum published on the engine's event bus. One variant
//! per exposed event name; payloads are strongly typed rather than ad hoc
//! JSON, and every event carries a wall-clock timestamp. Events are
//! ephemeral: the bus never persists them, consumers decide whether to.

use serde::{Deserialize, Serialize};

use crate::models::BotOutcome;

/// Names of the events the engine publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// A bot's pacing delay has started
    #[serde(rename = "bot:typing")]
    BotTyping,
    /// A bot's pipeline pass completed
    #[serde(rename = "bot:response")]
    BotResponse,
    /// A full orchestration round finished
    #[serde(rename = "round:completed")]
    RoundCompleted,
    /// A message was suppressed as a duplicate
    #[serde(rename = "pipeline:duplicate")]
    PipelineDuplicate,
}

impl EventName {
    /// Wire name of the event, as consumers subscribe to it.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::BotTyping => "bot:typing",
            EventName::BotResponse => "bot:response",
            EventName::RoundCompleted => "round:completed",
            EventName::PipelineDuplicate => "pipeline:duplicate",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event published on the bus, with one variant per event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// A bot's pacing delay has started
    #[serde(rename = "bot:typing")]
    BotTyping {
        bot_id: String,
        conversation_id: String,
        /// Publication timestamp (ISO 8601)
        timestamp: String,
    },

    /// A bot's pipeline pass completed
    #[serde(rename = "bot:response")]
    BotResponse {
        bot_id: String,
        conversation_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: String,
    },

    /// A full orchestration round finished
    #[serde(rename = "round:completed")]
    RoundCompleted {
        conversation_id: String,
        outcomes: Vec<BotOutcome>,
        timestamp: String,
    },

    /// A message was suppressed as a duplicate
    #[serde(rename = "pipeline:duplicate")]
    PipelineDuplicate {
        bot_id: String,
        conversation_id: String,
        timestamp: String,
    },
}

impl ChatEvent {
    /// The event's name, used for subscription matching.
    pub fn name(&self) -> EventName {
        match self {
            ChatEvent::BotTyping { .. } => EventName::BotTyping,
            ChatEvent::BotResponse { .. } => EventName::BotResponse,
            ChatEvent::RoundCompleted { .. } => EventName::RoundCompleted,
            ChatEvent::PipelineDuplicate { .. } => EventName::PipelineDuplicate,
        }
    }

    /// Create a `bot:typing` event stamped with the current time.
    pub fn bot_typing(bot_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        ChatEvent::BotTyping {
            bot_id: bot_id.into(),
            conversation_id: conversation_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a `bot:response` event stamped with the current time.
    pub fn bot_response(
        bot_id: impl Into<String>,
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        ChatEvent::BotResponse {
            bot_id: bot_id.into(),
            conversation_id: conversation_id.into(),
            content: content.into(),
            error,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a `round:completed` event stamped with the current time.
    pub fn round_completed(
        conversation_id: impl Into<String>,
        outcomes: Vec<BotOutcome>,
    ) -> Self {
        ChatEvent::RoundCompleted {
            conversation_id: conversation_id.into(),
            outcomes,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a `pipeline:duplicate` event stamped with the current time.
    pub fn pipeline_duplicate(
        bot_id: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        ChatEvent::PipelineDuplicate {
            bot_id: bot_id.into(),
            conversation_id: conversation_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
