//! Pipeline Driver
//!
//! Applies an ordered, short-circuitable sequence of stages to a message.
//! Stage *i*'s content/metadata become stage *i+1*'s input. The driver
//! stops on `skip_next_stages` (returning that outcome as final) and on
//! `error` (marking the whole pass failed).

use std::sync::Arc;

use crate::models::{Bot, ErrorKind};
use crate::services::dedup::DedupCache;

use super::stage::{PipelineContext, PipelineStage, StageMetadata, StageOutcome};
use super::stages::{DedupStage, LoggingStage};

/// Final output of one pipeline pass.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final content after the last executed stage
    pub content: String,
    /// Final metadata after the last executed stage
    pub metadata: StageMetadata,
    /// Error from the stage that failed the pass, if any
    pub error: Option<ErrorKind>,
    /// Whether a stage short-circuited the remaining stages
    pub short_circuited: bool,
    /// Name of the stage that stopped the pass, if any
    pub halted_by: Option<&'static str>,
}

impl PipelineOutput {
    /// Whether the pass failed (a stage returned an error).
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the pass was suppressed as a duplicate.
    pub fn is_duplicate(&self) -> bool {
        self.metadata
            .get(super::stages::META_IS_DUPLICATE)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Ordered chain of stage processors over a single message.
pub struct MessagePipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
}

impl MessagePipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The standard engine pipeline: deduplication, then logging.
    pub fn standard(dedup: Arc<DedupCache>) -> Self {
        Self::new()
            .with_stage(Arc::new(DedupStage::new(dedup)))
            .with_stage(Arc::new(LoggingStage))
    }

    /// Builder pattern: append a stage to the chain.
    pub fn with_stage(mut self, stage: Arc<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a stage to the chain.
    pub fn push_stage(&mut self, stage: Arc<dyn PipelineStage>) {
        self.stages.push(stage);
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the full chain over the context's original message for `bot`.
    pub fn run(&self, bot: &Bot, context: &mut PipelineContext) -> PipelineOutput {
        let content = context.original_message.content.clone();
        self.run_content(content, bot, context)
    }

    /// Run the full chain over explicit content (used by reprocessing
    /// stages that re-enter the pipeline on their own output).
    pub fn run_content(
        &self,
        content: String,
        bot: &Bot,
        context: &mut PipelineContext,
    ) -> PipelineOutput {
        let mut content = content;
        let mut metadata = StageMetadata::new();

        for stage in &self.stages {
            let outcome = stage.process(&content, bot, context, metadata);
            content = outcome.content;
            metadata = outcome.metadata;

            if let Some(error) = outcome.error {
                tracing::warn!(
                    stage = stage.name(),
                    bot_id = %bot.id,
                    "pipeline stage failed the pass"
                );
                return PipelineOutput {
                    content,
                    metadata,
                    error: Some(error),
                    short_circuited: true,
                    halted_by: Some(stage.name()),
                };
            }

            if outcome.skip_next_stages {
                return PipelineOutput {
                    content,
                    metadata,
                    error: None,
                    short_circuited: true,
                    halted_by: Some(stage.name()),
                };
            }
        }

        PipelineOutput {
            content,
            metadata,
            error: None,
            short_circuited: false,
            halted_by: None,
        }
    }
}

impl Default for MessagePipeline {
    fn default() -> Self {
        Self::new()
    }
}
