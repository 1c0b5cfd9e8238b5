//! Message Pipeline
//!
//! Ordered, short-circuitable chain of stage processors applied to a
//! message on its way to a bot.

pub mod driver;
pub mod stage;
pub mod stages;

pub use driver::{MessagePipeline, PipelineOutput};
pub use stage::{PipelineContext, PipelineStage, StageMetadata, StageOutcome};
pub use stages::{DedupStage, LoggingStage, DUPLICATE_NOTICE, META_IS_DUPLICATE};
