//! Orchestration Round Models
//!
//! Per-round state and per-bot outcomes. A round is the unit of work for
//! one incoming message: the set of bot dispatches it triggered and their
//! results. Rounds are never persisted by the engine; the caller externalizes
//! them (or consumes them from the event bus).

use serde::{Deserialize, Serialize};

/// Recoverable per-bot condition recorded in an outcome.
///
/// These are data, not raised errors: they describe why a bot produced no
/// normal reply without failing the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The message was suppressed as a duplicate (informational short-circuit)
    DuplicateSuppressed,
    /// The completion provider call failed or timed out
    ProviderFailure { message: String },
    /// The round's cancellation signal interrupted this dispatch
    CancellationRequested,
}

/// Lifecycle state of an orchestration round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Round created, nothing dispatched yet
    Pending,
    /// Bot dispatches in flight
    Dispatching,
    /// All dispatched bots produced an outcome (possibly with per-bot errors)
    Completed,
    /// The round could not run at all (no recipients, invalid config)
    Failed,
    /// The cancellation signal stopped the round before it finished
    Cancelled,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Pending => write!(f, "pending"),
            RoundStatus::Dispatching => write!(f, "dispatching"),
            RoundStatus::Completed => write!(f, "completed"),
            RoundStatus::Failed => write!(f, "failed"),
            RoundStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one bot's dispatch within a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotOutcome {
    /// Bot that was dispatched
    pub bot_id: String,
    /// Final reply content, when one was produced
    pub content: Option<String>,
    /// Recoverable condition, when the bot produced no normal reply
    pub error: Option<ErrorKind>,
    /// Wall time spent in the pipeline pass and provider call (milliseconds)
    pub latency_ms: u64,
    /// Dispatch timestamp (ISO 8601)
    pub dispatched_at: String,
}

impl BotOutcome {
    /// Create a successful outcome.
    pub fn success(bot_id: impl Into<String>, content: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            bot_id: bot_id.into(),
            content: Some(content.into()),
            error: None,
            latency_ms,
            dispatched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a failed outcome.
    pub fn failure(bot_id: impl Into<String>, error: ErrorKind, latency_ms: u64) -> Self {
        Self {
            bot_id: bot_id.into(),
            content: None,
            error: Some(error),
            latency_ms,
            dispatched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a duplicate-suppression outcome carrying the informational reply.
    pub fn suppressed(bot_id: impl Into<String>, notice: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            content: Some(notice.into()),
            error: Some(ErrorKind::DuplicateSuppressed),
            latency_ms: 0,
            dispatched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the bot produced a normal reply.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.content.is_some()
    }
}

/// The set of per-bot outcomes produced for one incoming message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRound {
    /// Unique round identifier (UUID)
    pub round_id: String,
    /// Conversation this round belongs to
    pub conversation_id: String,
    /// Lifecycle state
    pub status: RoundStatus,
    /// Per-bot outcomes in dispatch order (completion order for parallel rounds)
    pub outcomes: Vec<BotOutcome>,
}

impl OrchestrationRound {
    /// Create a pending round for a conversation.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            round_id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            status: RoundStatus::Pending,
            outcomes: Vec::new(),
        }
    }

    /// Number of outcomes carrying a normal reply.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of outcomes carrying a recorded error.
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}
