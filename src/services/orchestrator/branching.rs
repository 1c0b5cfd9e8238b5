//! Branch Selection Policy
//!
//! Under `ConditionalBranching` ordering the orchestrator asks an injected
//! policy which bot (if any) should respond next, before each step. The
//! policy sees the incoming message, the outcomes produced so far, and the
//! eligible roster. Returning `None` ends the round; the chat config's
//! `max_branch_steps` bounds the loop regardless.
//!
//! This is a pluggable strategy seam: the engine prescribes no selection
//! heuristic of its own.

use chorus_core::ChatMessage;

use crate::models::{Bot, BotOutcome};

/// Policy choosing the next bot to dispatch in a branching round.
pub trait BranchSelector: Send + Sync {
    /// Return the ID of the next bot to dispatch, or `None` to end the round.
    fn next_bot(
        &self,
        incoming: &ChatMessage,
        outcomes: &[BotOutcome],
        roster: &[Bot],
    ) -> Option<String>;
}

/// Any matching closure is a selector.
impl<F> BranchSelector for F
where
    F: Fn(&ChatMessage, &[BotOutcome], &[Bot]) -> Option<String> + Send + Sync,
{
    fn next_bot(
        &self,
        incoming: &ChatMessage,
        outcomes: &[BotOutcome],
        roster: &[Bot],
    ) -> Option<String> {
        self(incoming, outcomes, roster)
    }
}
