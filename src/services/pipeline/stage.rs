//! Pipeline Stage Contract
//!
//! A stage receives the current content, the target bot, the per-message
//! context, and the metadata accumulated so far, and returns exactly one
//! [`StageOutcome`] that becomes the next stage's input. The driver knows
//! nothing of stage semantics beyond this contract; that is what keeps the
//! pipeline composable.

use std::collections::HashMap;

use chorus_core::ChatMessage;

use crate::models::{Bot, ErrorKind};

/// Metadata accumulated across stages for one pipeline pass.
pub type StageMetadata = HashMap<String, serde_json::Value>;

/// Per-message, per-bot mutable state threaded through all stages.
///
/// Scoped to one orchestration pass and discarded after.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// The incoming message being processed
    pub original_message: ChatMessage,
    /// Reprocessing recursion guard: incremented when a stage re-runs the
    /// pipeline on its own output
    pub current_depth: u32,
    /// Whether this pass originated from a voice transcript ghost message
    pub is_voice_ghost: bool,
    /// Participant IDs present in the conversation
    pub participants: Vec<String>,
}

impl PipelineContext {
    /// Create a context for one pass over an incoming message.
    pub fn new(conversation_id: impl Into<String>, original_message: ChatMessage) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            original_message,
            current_depth: 0,
            is_voice_ghost: false,
            participants: Vec::new(),
        }
    }

    /// Builder pattern: set the participant roster
    pub fn with_participants(mut self, participants: Vec<String>) -> Self {
        self.participants = participants;
        self
    }

    /// Builder pattern: mark the pass as a voice ghost
    pub fn with_voice_ghost(mut self, is_voice_ghost: bool) -> Self {
        self.is_voice_ghost = is_voice_ghost;
        self
    }

    /// Derive the context for a reprocessing pass over `content`.
    pub fn reprocess(&self) -> Self {
        let mut next = self.clone();
        next.current_depth += 1;
        next
    }
}

/// Result returned by one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Content handed to the next stage (or returned as the final output)
    pub content: String,
    /// Metadata handed to the next stage
    pub metadata: StageMetadata,
    /// When set, the driver stops and marks the pass failed
    pub error: Option<ErrorKind>,
    /// When true, the driver stops and returns this outcome as final
    pub skip_next_stages: bool,
}

impl StageOutcome {
    /// Pass content and metadata through to the next stage.
    pub fn pass(content: impl Into<String>, metadata: StageMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
            error: None,
            skip_next_stages: false,
        }
    }

    /// Stop the pipeline and return this outcome as the final output.
    pub fn short_circuit(content: impl Into<String>, metadata: StageMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
            error: None,
            skip_next_stages: true,
        }
    }

    /// Stop the pipeline and mark the pass failed.
    pub fn fail(content: impl Into<String>, metadata: StageMetadata, error: ErrorKind) -> Self {
        Self {
            content: content.into(),
            metadata,
            error: Some(error),
            skip_next_stages: true,
        }
    }
}

/// One step in the ordered message-processing chain.
pub trait PipelineStage: Send + Sync {
    /// Stage name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Process the message on its way to (or from) a bot.
    fn process(
        &self,
        content: &str,
        bot: &Bot,
        context: &mut PipelineContext,
        metadata: StageMetadata,
    ) -> StageOutcome;
}
