//! Response Orchestrator
//!
//! Given an incoming message and a roster of bots, decides who answers and
//! how, then drives each bot's answer through the message pipeline and the
//! completion provider. Publishes progress on the event bus.
//!
//! Round state machine: `Pending -> Dispatching -> {Completed | Failed |
//! Cancelled}`. Individual bot failures are recorded in that bot's outcome
//! without failing the round; only zero eligible recipients or malformed
//! configuration fail the round as a whole.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use chorus_core::{ChatMessage, Message, Sender};
use chorus_llm::{CompletionOptions, CompletionProvider};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Bot, BotOutcome, ChatConfig, ErrorKind, InputConsideration, OrchestrationRound,
    ResponseOrdering, RoundStatus,
};
use crate::services::dedup::DedupCache;
use crate::services::events::{ChatEvent, EventBus};
use crate::services::pipeline::{MessagePipeline, PipelineContext};

use super::branching::BranchSelector;

/// Everything the orchestrator needs for one round, passed by value.
pub struct RoundRequest {
    /// Conversation the incoming message belongs to
    pub conversation_id: String,
    /// The incoming user (or bot) message
    pub message: ChatMessage,
    /// Bots configured for the conversation, in roster order
    pub roster: Vec<Bot>,
    /// Prior conversation history, excluding the incoming message
    pub history: Vec<ChatMessage>,
    /// Chat configuration, immutable for the duration of the round
    pub config: ChatConfig,
    /// Branching policy, required for `ConditionalBranching` ordering
    pub branch_selector: Option<Arc<dyn BranchSelector>>,
}

impl RoundRequest {
    /// Create a request with default config and empty history.
    pub fn new(
        conversation_id: impl Into<String>,
        message: ChatMessage,
        roster: Vec<Bot>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message,
            roster,
            history: Vec::new(),
            config: ChatConfig::default(),
            branch_selector: None,
        }
    }

    /// Builder pattern: set prior conversation history
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Builder pattern: set the chat configuration
    pub fn with_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder pattern: set the branching policy
    pub fn with_branch_selector(mut self, selector: Arc<dyn BranchSelector>) -> Self {
        self.branch_selector = Some(selector);
        self
    }
}

/// Drives orchestration rounds for all conversations in the process.
///
/// The event bus and deduplication cache are shared singletons owned by the
/// host and injected here; the orchestrator holds them by `Arc` rather than
/// reaching for hidden globals.
pub struct ResponseOrchestrator {
    bus: Arc<EventBus>,
    pipeline: Arc<MessagePipeline>,
    provider: Arc<dyn CompletionProvider>,
    /// Per-conversation round serialization locks
    conversation_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResponseOrchestrator {
    /// Create an orchestrator with the standard pipeline (dedup + logging).
    pub fn new(
        bus: Arc<EventBus>,
        dedup: Arc<DedupCache>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            bus,
            pipeline: Arc::new(MessagePipeline::standard(dedup)),
            provider,
            conversation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Builder pattern: replace the pipeline (e.g., to append custom stages).
    pub fn with_pipeline(mut self, pipeline: Arc<MessagePipeline>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Run one orchestration round for an incoming message.
    ///
    /// Returns the completed (or cancelled) round, or a round-level error
    /// when no bot was eligible or the configuration is invalid.
    pub async fn run_round(
        &self,
        request: RoundRequest,
        cancel: CancellationToken,
    ) -> EngineResult<OrchestrationRound> {
        request.config.validate()?;

        let eligible: Vec<Bot> = request
            .roster
            .iter()
            .filter(|b| b.enabled && b.id != request.message.sender_id)
            .cloned()
            .collect();
        if eligible.is_empty() {
            return Err(EngineError::NoEligibleRecipients);
        }

        // Rounds for the same conversation must not interleave; rounds for
        // distinct conversations never contend.
        let conversation_id = request.conversation_id.clone();
        let conversation_lock = self.conversation_lock(&conversation_id);
        let result = {
            let _guard = conversation_lock.lock().await;
            self.run_round_locked(&request, &eligible, &cancel).await
        };
        drop(conversation_lock);
        self.release_conversation_lock(&conversation_id);
        result
    }

    /// Run one round while holding the conversation lock.
    async fn run_round_locked(
        &self,
        request: &RoundRequest,
        eligible: &[Bot],
        cancel: &CancellationToken,
    ) -> EngineResult<OrchestrationRound> {
        let mut round = OrchestrationRound::new(&request.conversation_id);
        round.status = RoundStatus::Dispatching;
        tracing::info!(
            conversation_id = %round.conversation_id,
            round_id = %round.round_id,
            ordering = %request.config.response_ordering,
            eligible = eligible.len(),
            "orchestration round dispatching"
        );

        round.outcomes = match request.config.response_ordering {
            ResponseOrdering::RoundRobin => self.run_sequential(request, eligible, cancel).await,
            ResponseOrdering::Parallel => self.run_parallel(request, eligible, cancel).await,
            ResponseOrdering::CustomOrder => {
                let order = resolve_custom_order(&request.config.custom_order, eligible)?;
                self.run_sequential(request, &order, cancel).await
            }
            ResponseOrdering::ConditionalBranching => {
                self.run_branching(request, eligible, cancel).await?
            }
        };

        round.status = if cancel.is_cancelled() {
            RoundStatus::Cancelled
        } else {
            RoundStatus::Completed
        };

        tracing::info!(
            conversation_id = %round.conversation_id,
            round_id = %round.round_id,
            status = %round.status,
            successes = round.success_count(),
            errors = round.error_count(),
            "orchestration round finished"
        );
        self.bus.publish(&ChatEvent::round_completed(
            round.conversation_id.clone(),
            round.outcomes.clone(),
        ));

        Ok(round)
    }

    /// Sequential dispatch: bot *i+1* is not dispatched until bot *i*'s
    /// pass (including its completion call) finishes, successfully or not.
    async fn run_sequential(
        &self,
        request: &RoundRequest,
        order: &[Bot],
        cancel: &CancellationToken,
    ) -> Vec<BotOutcome> {
        let mut outcomes = Vec::with_capacity(order.len());
        for bot in order {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = self.dispatch_bot(request, bot, cancel).await;
            let interrupted = outcome.error == Some(ErrorKind::CancellationRequested);
            outcomes.push(outcome);
            if interrupted {
                break;
            }
        }
        outcomes
    }

    /// Parallel dispatch: one task per eligible bot, round complete when
    /// all have finished. No completion-order guarantee.
    async fn run_parallel(
        &self,
        request: &RoundRequest,
        order: &[Bot],
        cancel: &CancellationToken,
    ) -> Vec<BotOutcome> {
        let dispatches = order.iter().map(|bot| self.dispatch_bot(request, bot, cancel));
        join_all(dispatches).await
    }

    /// Branching dispatch: the injected policy chooses the next bot before
    /// each step; stops when the policy declines or the step bound is hit.
    async fn run_branching(
        &self,
        request: &RoundRequest,
        eligible: &[Bot],
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<BotOutcome>> {
        let selector = request.branch_selector.as_ref().ok_or_else(|| {
            EngineError::configuration("conditional_branching ordering requires a branch selector")
        })?;

        let mut outcomes = Vec::new();
        for _ in 0..request.config.max_branch_steps {
            if cancel.is_cancelled() {
                break;
            }
            let Some(next_id) = selector.next_bot(&request.message, &outcomes, eligible) else {
                break;
            };
            let bot = eligible.iter().find(|b| b.id == next_id).ok_or_else(|| {
                EngineError::configuration(format!(
                    "branch selector chose a bot outside the eligible roster: {}",
                    next_id
                ))
            })?;

            let outcome = self.dispatch_bot(request, bot, cancel).await;
            let interrupted = outcome.error == Some(ErrorKind::CancellationRequested);
            outcomes.push(outcome);
            if interrupted {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Drive one bot's answer: pacing delay, pipeline pass, provider call.
    ///
    /// Every failure mode is caught and recorded in the returned outcome so
    /// sibling bots are unaffected.
    async fn dispatch_bot(
        &self,
        request: &RoundRequest,
        bot: &Bot,
        cancel: &CancellationToken,
    ) -> BotOutcome {
        self.bus
            .publish(&ChatEvent::bot_typing(&bot.id, &request.conversation_id));

        let delay = pacing_delay(bot, &request.config);
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return BotOutcome::failure(&bot.id, ErrorKind::CancellationRequested, 0);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let started = tokio::time::Instant::now();
        let mut context = PipelineContext::new(&request.conversation_id, request.message.clone())
            .with_participants(participant_ids(request));
        let output = self.pipeline.run(bot, &mut context);

        if output.is_duplicate() {
            self.bus.publish(&ChatEvent::pipeline_duplicate(
                &bot.id,
                &request.conversation_id,
            ));
            self.bus.publish(&ChatEvent::bot_response(
                &bot.id,
                &request.conversation_id,
                output.content.clone(),
                None,
            ));
            return BotOutcome::suppressed(&bot.id, output.content);
        }

        if let Some(error) = output.error {
            let latency_ms = started.elapsed().as_millis() as u64;
            self.bus.publish(&ChatEvent::bot_response(
                &bot.id,
                &request.conversation_id,
                String::new(),
                Some(format!("{:?}", error)),
            ));
            return BotOutcome::failure(&bot.id, error, latency_ms);
        }

        let history = visible_history(request, &output.content);
        let options = CompletionOptions::new(&bot.model, bot.temperature);

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                let latency_ms = started.elapsed().as_millis() as u64;
                return BotOutcome::failure(&bot.id, ErrorKind::CancellationRequested, latency_ms);
            }
            result = self.provider.generate(&bot.system_prompt, &history, &options, None) => result,
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                self.bus.publish(&ChatEvent::bot_response(
                    &bot.id,
                    &request.conversation_id,
                    response.content.clone(),
                    None,
                ));
                BotOutcome::success(&bot.id, response.content, latency_ms)
            }
            Err(err) => {
                tracing::warn!(
                    bot_id = %bot.id,
                    conversation_id = %request.conversation_id,
                    error = %err,
                    "completion provider failed"
                );
                self.bus.publish(&ChatEvent::bot_response(
                    &bot.id,
                    &request.conversation_id,
                    String::new(),
                    Some(err.to_string()),
                ));
                BotOutcome::failure(
                    &bot.id,
                    ErrorKind::ProviderFailure {
                        message: err.to_string(),
                    },
                    latency_ms,
                )
            }
        }
    }

    fn conversation_lock(&self, conversation_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop a conversation's lock entry once no round holds or awaits it,
    /// so the map does not grow with every conversation ever orchestrated.
    fn release_conversation_lock(&self, conversation_id: &str) {
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The map's clone is the only one left iff no other round is
        // holding or awaiting this conversation's lock.
        let unused = locks
            .get(conversation_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(conversation_id);
        }
    }

    #[cfg(test)]
    fn conversation_lock_count(&self) -> usize {
        self.conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Pacing delay for one bot: typing-indicator delay plus uniform jitter
/// from the bot's own delay range when set, else the chat-level bounds.
fn pacing_delay(bot: &Bot, config: &ChatConfig) -> Duration {
    let (min_ms, max_ms) = bot
        .response_delay_range
        .unwrap_or((config.min_response_delay_ms, config.max_response_delay_ms));
    let jitter = if max_ms > min_ms {
        rand::thread_rng().gen_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    Duration::from_millis(config.typing_indicator_delay_ms + jitter)
}

/// Map a custom-order ID list onto the eligible roster. Unknown or
/// duplicate IDs are a configuration error.
fn resolve_custom_order(order_ids: &[String], eligible: &[Bot]) -> EngineResult<Vec<Bot>> {
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(order_ids.len());
    for id in order_ids {
        if !seen.insert(id.as_str()) {
            return Err(EngineError::configuration(format!(
                "custom_order lists bot {} more than once",
                id
            )));
        }
        let bot = eligible.iter().find(|b| &b.id == id).ok_or_else(|| {
            EngineError::configuration(format!(
                "custom_order references a bot outside the eligible roster: {}",
                id
            ))
        })?;
        order.push(bot.clone());
    }
    Ok(order)
}

/// All participant IDs involved in the request (roster plus the sender).
fn participant_ids(request: &RoundRequest) -> Vec<String> {
    let mut ids: Vec<String> = request.roster.iter().map(|b| b.id.clone()).collect();
    if !ids.contains(&request.message.sender_id) {
        ids.push(request.message.sender_id.clone());
    }
    ids
}

/// Build the provider-facing history for one bot: prior messages filtered
/// per the input-consideration policy, then the (pipeline-transformed)
/// incoming message as the final turn.
fn visible_history(request: &RoundRequest, final_content: &str) -> Vec<Message> {
    let config = &request.config;
    let mut history: Vec<Message> = request
        .history
        .iter()
        .filter(|m| match config.input_consideration {
            InputConsideration::UserOnly => m.sender == Sender::User,
            InputConsideration::UserAndBots => true,
            InputConsideration::SelectedParticipants => {
                config.selected_participants.contains(&m.sender_id)
                    || m.sender_id == request.message.sender_id
            }
        })
        .map(Message::from)
        .collect();

    let mut incoming = request.message.clone();
    incoming.content = final_content.to_string();
    history.push(Message::from(&incoming));
    history
}
