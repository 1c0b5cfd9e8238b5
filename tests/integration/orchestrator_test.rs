//! Orchestrator Integration Tests
//!
//! Full orchestration rounds across every ordering policy: strict
//! sequential order, parallel fan-out, custom permutations, conditional
//! branching, failure isolation, duplicate suppression, pacing, and
//! cancellation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Barrier, Notify};
use tokio_util::sync::CancellationToken;

use chorus_core::{ChatMessage, Message};
use chorus_engine::services::pipeline::DUPLICATE_NOTICE;
use chorus_engine::{
    Bot, BotOutcome, ChatConfig, DedupCache, EngineError, ErrorKind, EventBus,
    InputConsideration, ResponseOrchestrator, ResponseOrdering, RoundRequest, RoundStatus,
};
use chorus_llm::{
    CompletionOptions, CompletionProvider, CompletionResponse, LlmError, LlmResult,
    ScriptedProvider,
};

fn roster3() -> Vec<Bot> {
    vec![
        Bot::new("a", "A", "You are A.", "model-a"),
        Bot::new("b", "B", "You are B.", "model-b"),
        Bot::new("c", "C", "You are C.", "model-c"),
    ]
}

fn orchestrator(provider: Arc<dyn CompletionProvider>) -> ResponseOrchestrator {
    ResponseOrchestrator::new(
        Arc::new(EventBus::new()),
        Arc::new(DedupCache::new()),
        provider,
    )
}

fn incoming(content: &str) -> ChatMessage {
    ChatMessage::from_user("alice", content)
}

// ============================================================================
// Ordering policies
// ============================================================================

#[tokio::test]
async fn round_robin_dispatches_in_roster_order() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("model-a", "from a")
            .reply("model-b", "from b")
            .reply("model-c", "from c"),
    );
    let orchestrator = orchestrator(provider.clone());

    let request = RoundRequest::new("conv-1", incoming("hello"), roster3());
    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(round.status, RoundStatus::Completed);
    assert_eq!(
        provider.called_models(),
        vec!["model-a", "model-b", "model-c"]
    );
    let ids: Vec<&str> = round.outcomes.iter().map(|o| o.bot_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(round.success_count(), 3);
}

#[tokio::test]
async fn custom_order_follows_supplied_permutation() {
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator(provider.clone());

    let config = ChatConfig::default()
        .with_ordering(ResponseOrdering::CustomOrder)
        .with_custom_order(vec!["c".to_string(), "a".to_string()]);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3()).with_config(config);

    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(provider.called_models(), vec!["model-c", "model-a"]);
    assert_eq!(round.outcomes.len(), 2);
}

#[tokio::test]
async fn custom_order_with_unknown_bot_fails_the_round() {
    let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()));

    let config = ChatConfig::default()
        .with_ordering(ResponseOrdering::CustomOrder)
        .with_custom_order(vec!["ghost".to_string()]);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3()).with_config(config);

    let err = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationInvalid(_)));
}

/// Provider that forces all participants to rendezvous before any of them
/// completes: only a genuinely concurrent fan-out can pass.
struct BarrierProvider {
    barrier: Barrier,
    log: Mutex<Vec<(&'static str, String)>>,
}

#[async_trait]
impl CompletionProvider for BarrierProvider {
    fn name(&self) -> &'static str {
        "barrier"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _history: &[Message],
        options: &CompletionOptions,
        _chunk_tx: Option<tokio::sync::mpsc::Sender<String>>,
    ) -> LlmResult<CompletionResponse> {
        self.log
            .lock()
            .unwrap()
            .push(("dispatch", options.model.clone()));
        self.barrier.wait().await;
        self.log
            .lock()
            .unwrap()
            .push(("complete", options.model.clone()));
        Ok(CompletionResponse::text("done"))
    }
}

#[tokio::test]
async fn parallel_fans_out_all_bots_before_any_completion() {
    let provider = Arc::new(BarrierProvider {
        barrier: Barrier::new(3),
        log: Mutex::new(Vec::new()),
    });
    let orchestrator = orchestrator(provider.clone());

    let config = ChatConfig::default().with_ordering(ResponseOrdering::Parallel);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3()).with_config(config);

    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(round.status, RoundStatus::Completed);
    assert_eq!(round.outcomes.len(), 3);

    // All three dispatches precede the earliest completion
    let log = provider.log.lock().unwrap();
    assert_eq!(log.len(), 6);
    assert!(log[..3].iter().all(|(phase, _)| *phase == "dispatch"));
    assert!(log[3..].iter().all(|(phase, _)| *phase == "complete"));
}

#[tokio::test]
async fn conditional_branching_stops_when_selector_declines() {
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator(provider.clone());

    // Dispatch exactly one bot, then decline
    let selector = |_: &ChatMessage, outcomes: &[BotOutcome], roster: &[Bot]| {
        if outcomes.is_empty() {
            roster.first().map(|b| b.id.clone())
        } else {
            None
        }
    };

    let config = ChatConfig::default().with_ordering(ResponseOrdering::ConditionalBranching);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3())
        .with_config(config)
        .with_branch_selector(Arc::new(selector));

    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(round.outcomes.len(), 1);
    assert_eq!(round.outcomes[0].bot_id, "a");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn conditional_branching_is_bounded_by_max_steps() {
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator(provider.clone());

    // A selector that never declines must still terminate
    let selector = |_: &ChatMessage, _: &[BotOutcome], roster: &[Bot]| {
        roster.first().map(|b| b.id.clone())
    };

    let config = ChatConfig::default()
        .with_ordering(ResponseOrdering::ConditionalBranching)
        .with_max_branch_steps(3);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3())
        .with_config(config)
        .with_branch_selector(Arc::new(selector));

    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(round.outcomes.len(), 3);
}

#[tokio::test]
async fn conditional_branching_without_selector_is_invalid() {
    let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()));

    let config = ChatConfig::default().with_ordering(ResponseOrdering::ConditionalBranching);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3()).with_config(config);

    let err = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationInvalid(_)));
}

// ============================================================================
// Failure isolation & round-level errors
// ============================================================================

#[tokio::test]
async fn provider_failure_for_one_bot_does_not_sink_the_round() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("model-a", "from a")
            .fail(
                "model-b",
                LlmError::ServerError {
                    message: "upstream exploded".to_string(),
                    status: Some(500),
                },
            )
            .reply("model-c", "from c"),
    );
    let orchestrator = orchestrator(provider);

    let request = RoundRequest::new("conv-1", incoming("hello"), roster3());
    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(round.status, RoundStatus::Completed);
    assert_eq!(round.outcomes.len(), 3);
    assert!(round.outcomes[0].is_success());
    assert!(matches!(
        round.outcomes[1].error,
        Some(ErrorKind::ProviderFailure { .. })
    ));
    assert!(round.outcomes[2].is_success());
}

#[tokio::test]
async fn all_bots_failing_is_still_a_completed_round() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .fail(
                "model-a",
                LlmError::Timeout { seconds: 30 },
            )
            .fail(
                "model-b",
                LlmError::Timeout { seconds: 30 },
            )
            .fail(
                "model-c",
                LlmError::Timeout { seconds: 30 },
            ),
    );
    let orchestrator = orchestrator(provider);

    let request = RoundRequest::new("conv-1", incoming("hello"), roster3());
    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    // Distinct from a failed round: every bot got an attempt and an outcome
    assert_eq!(round.status, RoundStatus::Completed);
    assert_eq!(round.error_count(), 3);
}

#[tokio::test]
async fn zero_eligible_bots_fails_the_round() {
    let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()));

    let roster: Vec<Bot> = roster3()
        .into_iter()
        .map(|b| b.with_enabled(false))
        .collect();
    let request = RoundRequest::new("conv-1", incoming("hello"), roster);

    let err = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoEligibleRecipients));
}

#[tokio::test]
async fn sending_bot_does_not_answer_itself() {
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator(provider.clone());

    let message = ChatMessage::from_bot("a", "bot a speaking");
    let request = RoundRequest::new("conv-1", message, roster3());

    let round = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<&str> = round.outcomes.iter().map(|o| o.bot_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[tokio::test]
async fn malformed_delay_bounds_fail_the_round() {
    let orchestrator = orchestrator(Arc::new(ScriptedProvider::new()));

    let config = ChatConfig::default().with_response_delay_bounds(500, 100);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster3()).with_config(config);

    let err = orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationInvalid(_)));
}

// ============================================================================
// Duplicate suppression scenario
// ============================================================================

#[tokio::test]
async fn duplicate_dispatch_is_suppressed_with_informational_reply() {
    let provider = Arc::new(ScriptedProvider::new().reply("model-a", "real answer"));
    let roster = vec![Bot::new("bot1", "Bot One", "prompt", "model-a")];
    let orchestrator = orchestrator(provider.clone());

    let first = orchestrator
        .run_round(
            RoundRequest::new("conv-1", incoming("hello"), roster.clone()),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(first.outcomes[0].content.as_deref(), Some("real answer"));

    // Same (participant, bot, content) triple within the TTL window
    let second = orchestrator
        .run_round(
            RoundRequest::new("conv-1", incoming("hello"), roster),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(second.status, RoundStatus::Completed);
    assert_eq!(
        second.outcomes[0].error,
        Some(ErrorKind::DuplicateSuppressed)
    );
    assert_eq!(second.outcomes[0].content.as_deref(), Some(DUPLICATE_NOTICE));
    // The provider was never consulted for the duplicate
    assert_eq!(provider.call_count(), 1);
}

// ============================================================================
// Pacing & input consideration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn pacing_delay_is_applied_before_dispatch() {
    let provider = Arc::new(ScriptedProvider::new());
    let roster = vec![Bot::new("a", "A", "prompt", "model-a").with_response_delay_range(50, 50)];
    let orchestrator = orchestrator(provider);

    let config = ChatConfig::default().with_typing_indicator_delay(100);
    let request = RoundRequest::new("conv-1", incoming("hello"), roster).with_config(config);

    let started = tokio::time::Instant::now();
    orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    // typing indicator (100ms) + fixed jitter (50ms)
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn user_only_consideration_hides_bot_turns_from_the_prompt() {
    /// Captures the history each call receives.
    struct CapturingProvider {
        histories: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl CompletionProvider for CapturingProvider {
        fn name(&self) -> &'static str {
            "capturing"
        }

        async fn generate(
            &self,
            _system_prompt: &str,
            history: &[Message],
            _options: &CompletionOptions,
            _chunk_tx: Option<tokio::sync::mpsc::Sender<String>>,
        ) -> LlmResult<CompletionResponse> {
            self.histories.lock().unwrap().push(history.to_vec());
            Ok(CompletionResponse::text("ok"))
        }
    }

    let provider = Arc::new(CapturingProvider {
        histories: Mutex::new(Vec::new()),
    });
    let orchestrator = orchestrator(provider.clone());

    let history = vec![
        ChatMessage::from_user("alice", "earlier user turn"),
        ChatMessage::from_bot("b", "earlier bot turn"),
    ];
    let config = ChatConfig::default().with_input_consideration(InputConsideration::UserOnly);
    let roster = vec![Bot::new("a", "A", "prompt", "model-a")];
    let request = RoundRequest::new("conv-1", incoming("latest"), roster)
        .with_history(history)
        .with_config(config);

    orchestrator
        .run_round(request, CancellationToken::new())
        .await
        .unwrap();

    let histories = provider.histories.lock().unwrap();
    let seen = &histories[0];
    // earlier user turn + incoming; the bot turn was stripped
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|m| m.role == chorus_core::Role::User));
}

// ============================================================================
// Cancellation
// ============================================================================

/// Provider that signals when a call starts and then never returns,
/// forcing the round to park at its provider suspension point.
struct HangingProvider {
    started: Arc<Notify>,
}

#[async_trait]
impl CompletionProvider for HangingProvider {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _history: &[Message],
        _options: &CompletionOptions,
        _chunk_tx: Option<tokio::sync::mpsc::Sender<String>>,
    ) -> LlmResult<CompletionResponse> {
        self.started.notify_one();
        std::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }
}

#[tokio::test]
async fn cancellation_stops_remaining_dispatches_and_preserves_outcomes() {
    let started = Arc::new(Notify::new());
    let provider = Arc::new(HangingProvider {
        started: started.clone(),
    });
    let orchestrator = Arc::new(orchestrator(provider));

    let request = RoundRequest::new("conv-1", incoming("hello"), roster3());
    let cancel = CancellationToken::new();

    let task = {
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run_round(request, cancel).await })
    };

    // Wait until bot "a" is parked inside the provider, then cancel
    started.notified().await;
    cancel.cancel();

    let round = task.await.unwrap().unwrap();
    assert_eq!(round.status, RoundStatus::Cancelled);
    assert_eq!(round.outcomes.len(), 1);
    assert_eq!(round.outcomes[0].bot_id, "a");
    assert_eq!(
        round.outcomes[0].error,
        Some(ErrorKind::CancellationRequested)
    );
}
