//! Chat Configuration Models
//!
//! External configuration controlling ordering, pacing, and
//! context-visibility policy for a chat. Passed by value into the
//! orchestrator and immutable for the duration of one orchestration call.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How bots respond to an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Bots respond strictly one after another in roster order
    RoundRobin,
    /// All eligible bots are dispatched concurrently
    Parallel,
    /// Sequential, using an explicitly supplied permutation of bot IDs
    CustomOrder,
    /// An injected predicate chooses the next bot before each step
    ConditionalBranching,
}

impl std::fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseOrdering::RoundRobin => write!(f, "round_robin"),
            ResponseOrdering::Parallel => write!(f, "parallel"),
            ResponseOrdering::CustomOrder => write!(f, "custom_order"),
            ResponseOrdering::ConditionalBranching => write!(f, "conditional_branching"),
        }
    }
}

/// Which prior messages are visible when building a bot's prompt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputConsideration {
    /// Strip prior bot messages from context
    UserOnly,
    /// Include user and bot messages
    UserAndBots,
    /// Include only an explicitly named subset of participants
    SelectedParticipants,
}

/// Configuration for one chat, owned and persisted externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Ordering/concurrency policy for bot responses
    pub response_ordering: ResponseOrdering,
    /// Whether the host persists the session (informational to the engine)
    pub session_persistence: bool,
    /// Fixed delay before each bot dispatch, giving UIs time to show a
    /// typing indicator (milliseconds)
    pub typing_indicator_delay_ms: u64,
    /// Lower bound of the per-bot jitter delay (milliseconds)
    pub min_response_delay_ms: u64,
    /// Upper bound of the per-bot jitter delay (milliseconds)
    pub max_response_delay_ms: u64,
    /// Context-visibility policy
    pub input_consideration: InputConsideration,
    /// Explicit dispatch permutation for `CustomOrder` (bot IDs)
    pub custom_order: Vec<String>,
    /// Participant IDs visible under `SelectedParticipants`
    pub selected_participants: Vec<String>,
    /// Loop-prevention bound for `ConditionalBranching`
    pub max_branch_steps: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            response_ordering: ResponseOrdering::RoundRobin,
            session_persistence: true,
            typing_indicator_delay_ms: 0,
            min_response_delay_ms: 0,
            max_response_delay_ms: 0,
            input_consideration: InputConsideration::UserAndBots,
            custom_order: Vec::new(),
            selected_participants: Vec::new(),
            max_branch_steps: 8,
        }
    }
}

impl ChatConfig {
    /// Builder pattern: set the ordering policy
    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.response_ordering = ordering;
        self
    }

    /// Builder pattern: set the context-visibility policy
    pub fn with_input_consideration(mut self, consideration: InputConsideration) -> Self {
        self.input_consideration = consideration;
        self
    }

    /// Builder pattern: set typing indicator delay (milliseconds)
    pub fn with_typing_indicator_delay(mut self, delay_ms: u64) -> Self {
        self.typing_indicator_delay_ms = delay_ms;
        self
    }

    /// Builder pattern: set jitter delay bounds (milliseconds)
    pub fn with_response_delay_bounds(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_response_delay_ms = min_ms;
        self.max_response_delay_ms = max_ms;
        self
    }

    /// Builder pattern: set the custom dispatch order
    pub fn with_custom_order(mut self, order: Vec<String>) -> Self {
        self.custom_order = order;
        self
    }

    /// Builder pattern: set the visible participant subset
    pub fn with_selected_participants(mut self, participants: Vec<String>) -> Self {
        self.selected_participants = participants;
        self
    }

    /// Builder pattern: set the branching step bound
    pub fn with_max_branch_steps(mut self, steps: u32) -> Self {
        self.max_branch_steps = steps;
        self
    }

    /// Validate the configuration before a round is dispatched.
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_response_delay_ms > self.max_response_delay_ms {
            return Err(EngineError::configuration(format!(
                "min_response_delay_ms ({}) exceeds max_response_delay_ms ({})",
                self.min_response_delay_ms, self.max_response_delay_ms
            )));
        }

        if self.response_ordering == ResponseOrdering::CustomOrder && self.custom_order.is_empty()
        {
            return Err(EngineError::configuration(
                "custom_order ordering requires a non-empty custom_order list",
            ));
        }

        if self.response_ordering == ResponseOrdering::ConditionalBranching
            && self.max_branch_steps == 0
        {
            return Err(EngineError::configuration(
                "conditional_branching ordering requires max_branch_steps >= 1",
            ));
        }

        if self.input_consideration == InputConsideration::SelectedParticipants
            && self.selected_participants.is_empty()
        {
            return Err(EngineError::configuration(
                "selected_participants input consideration requires a non-empty participant list",
            ));
        }

        Ok(())
    }
}
