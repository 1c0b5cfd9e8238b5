//! Built-in Pipeline Stages
//!
//! The engine ships two stages, executed in this order:
//!
//! 1. [`DedupStage`] — atomic check-and-set against the deduplication
//!    cache; a hit short-circuits the pass with a fixed informational reply.
//! 2. [`LoggingStage`] — pure pass-through that records before/after
//!    content for diagnostics; never errors, never short-circuits.
//!
//! Additional stages (moderation, enrichment, reprocessing) append to the
//! same ordered list.

use std::sync::Arc;

use crate::models::Bot;
use crate::services::dedup::DedupCache;

use super::stage::{PipelineContext, PipelineStage, StageMetadata, StageOutcome};

/// Metadata key set to `true` when a pass is suppressed as a duplicate.
pub const META_IS_DUPLICATE: &str = "isDuplicate";

/// Fixed informational reply for a suppressed duplicate.
pub const DUPLICATE_NOTICE: &str = "I've already processed this message.";

/// Deduplication stage: suppresses a message already seen for the same
/// (sender, bot) pair within the cache TTL.
pub struct DedupStage {
    cache: Arc<DedupCache>,
}

impl DedupStage {
    /// Create the stage over a shared cache.
    pub fn new(cache: Arc<DedupCache>) -> Self {
        Self { cache }
    }
}

impl PipelineStage for DedupStage {
    fn name(&self) -> &'static str {
        "dedup"
    }

    fn process(
        &self,
        content: &str,
        bot: &Bot,
        context: &mut PipelineContext,
        mut metadata: StageMetadata,
    ) -> StageOutcome {
        // Reprocessing passes re-enter the pipeline with content this stage
        // already registered; checking again would suppress them forever.
        if context.current_depth > 0 {
            return StageOutcome::pass(content, metadata);
        }

        let sender_id = context.original_message.sender_id.as_str();
        if self.cache.check_and_register(sender_id, &bot.id, content) {
            tracing::debug!(
                bot_id = %bot.id,
                sender_id,
                "duplicate message suppressed"
            );
            metadata.insert(META_IS_DUPLICATE.to_string(), serde_json::json!(true));
            return StageOutcome::short_circuit(DUPLICATE_NOTICE, metadata);
        }

        StageOutcome::pass(content, metadata)
    }
}

/// Logging stage: records the pass for diagnostics and hands content
/// through untouched.
pub struct LoggingStage;

impl PipelineStage for LoggingStage {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process(
        &self,
        content: &str,
        bot: &Bot,
        context: &mut PipelineContext,
        metadata: StageMetadata,
    ) -> StageOutcome {
        tracing::debug!(
            bot_id = %bot.id,
            conversation_id = %context.conversation_id,
            depth = context.current_depth,
            content_chars = content.len(),
            metadata_keys = metadata.len(),
            "pipeline pass"
        );
        StageOutcome::pass(content, metadata)
    }
}
