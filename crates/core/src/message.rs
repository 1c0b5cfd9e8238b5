//! Conversation Message Types
//!
//! Two message shapes live here:
//!
//! - [`ChatMessage`] — the engine-facing conversation record, carrying the
//!   sender identity the orchestrator needs for eligibility, deduplication,
//!   and input-consideration filtering.
//! - [`Message`] — the provider-facing role/content pair handed to a
//!   completion provider when assembling a prompt.
//!
//! The engine converts between the two at the prompt-assembly boundary; the
//! provider never sees participant identities, only roles.

use serde::{Deserialize, Serialize};

/// Kind of participant that authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The human user in the conversation
    User,
    /// A configured bot/companion
    Bot,
}

/// A single message in a conversation, as seen by the orchestration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier (UUID)
    pub id: String,
    /// Identifier of the participant that authored the message
    pub sender_id: String,
    /// Whether the author is the user or a bot
    pub sender: Sender,
    /// Message text
    pub content: String,
    /// Creation timestamp (ISO 8601)
    pub timestamp: String,
}

impl ChatMessage {
    /// Create a message with an explicit id.
    pub fn new(
        id: impl Into<String>,
        sender_id: impl Into<String>,
        sender: Sender,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            sender,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a user message with a generated UUID.
    pub fn from_user(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            sender_id,
            Sender::User,
            content,
        )
    }

    /// Create a bot message with a generated UUID.
    pub fn from_bot(bot_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            bot_id,
            Sender::Bot,
            content,
        )
    }
}

/// Role of a provider-facing prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System prompt
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

/// A role/content pair sent to a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for Message {
    /// Map a conversation record to a provider message: user turns become
    /// `User`, bot turns become `Assistant`.
    fn from(msg: &ChatMessage) -> Self {
        match msg.sender {
            Sender::User => Message::user(msg.content.clone()),
            Sender::Bot => Message::assistant(msg.content.clone()),
        }
    }
}
