//! Chorus Engine
//!
//! Multi-companion conversation orchestration: given an incoming message in
//! a group chat with one or more AI companions, decide which bots respond,
//! in what order and concurrency pattern, and with what pacing, while
//! suppressing duplicate triggers and isolating per-bot failures.
//!
//! ## Components
//!
//! - [`services::events`] - typed publish/subscribe event bus
//! - [`services::dedup`] - time-windowed deduplication cache
//! - [`services::pipeline`] - ordered, short-circuitable message pipeline
//! - [`services::orchestrator`] - response ordering, pacing, and dispatch
//!
//! ## Ownership
//!
//! The event bus and deduplication cache are one-per-process shared
//! instances, constructed explicitly at application start-up and injected
//! into the orchestrator by `Arc` -- no hidden globals.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use chorus_engine::models::{Bot, ChatConfig};
//! use chorus_engine::services::dedup::DedupCache;
//! use chorus_engine::services::events::EventBus;
//! use chorus_engine::services::orchestrator::{ResponseOrchestrator, RoundRequest};
//! use chorus_llm::ScriptedProvider;
//! use chorus_core::ChatMessage;
//!
//! # async fn run() -> Result<(), chorus_engine::error::EngineError> {
//! let bus = Arc::new(EventBus::new());
//! let dedup = Arc::new(DedupCache::new());
//! let shutdown = CancellationToken::new();
//! let _sweeper = dedup.spawn_sweeper(shutdown.clone());
//!
//! let provider = Arc::new(ScriptedProvider::new());
//! let orchestrator = ResponseOrchestrator::new(bus, dedup, provider);
//!
//! let roster = vec![Bot::create("Iris", "You are Iris.", "model-a")];
//! let request = RoundRequest::new(
//!     "conv-1",
//!     ChatMessage::from_user("alice", "hello"),
//!     roster,
//! );
//! let round = orchestrator.run_round(request, CancellationToken::new()).await?;
//! println!("{} outcomes", round.outcomes.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod services;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{EngineError, EngineResult};

// ── Models ─────────────────────────────────────────────────────────────
pub use models::{
    Bot, BotOutcome, ChatConfig, ErrorKind, InputConsideration, OrchestrationRound,
    ResponseOrdering, RoundStatus,
};

// ── Services ───────────────────────────────────────────────────────────
pub use services::dedup::DedupCache;
pub use services::events::{ChatEvent, EventBus, EventName, SubscribeOptions};
pub use services::orchestrator::{BranchSelector, ResponseOrchestrator, RoundRequest};
pub use services::pipeline::{
    MessagePipeline, PipelineContext, PipelineOutput, PipelineStage, StageMetadata, StageOutcome,
};
