//! End-to-end scenarios for the debate orchestrator, run against mock
//! providers and summarizers rather than a live LLM endpoint.

use std::sync::Arc;

use debate_core::{
    AgentConfig, Contribution, ContributionType, DebateConfig, DebateError, DebateHookEvent,
    DebateStatus, DebateStore, HookBus, JudgeAgent, Orchestrator, Provider, RoleAgent,
    RolePromptRegistry, Role, SummarizationConfig, SummarizationMethod, SynthesisMethod,
    TerminationCondition,
};
use tokio_util::sync::CancellationToken;

mod support {
    use async_trait::async_trait;
    use debate_core::{CompletionRequest, CompletionResponse, ProviderError, ProviderPort, Usage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct EchoProvider {
        calls: AtomicUsize,
        sleep_ms: u64,
    }

    impl EchoProvider {
        pub fn new() -> Self {
            EchoProvider {
                calls: AtomicUsize::new(0),
                sleep_ms: 0,
            }
        }

        pub fn with_sleep(sleep_ms: u64) -> Self {
            EchoProvider {
                calls: AtomicUsize::new(0),
                sleep_ms,
            }
        }
    }

    #[async_trait]
    impl ProviderPort for EchoProvider {
        async fn complete(
            &self,
            req: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.sleep_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.sleep_ms)).await;
            }
            let role = req
                .system_prompt
                .split_whitespace()
                .find(|w| w.starts_with("ROLE:"))
                .map(|w| w.trim_start_matches("ROLE:"))
                .unwrap_or("unknown");
            let kind = if req.system_prompt.contains("critique") {
                "critique"
            } else if req.system_prompt.contains("refine") {
                "refined"
            } else {
                "proposal"
            };
            Ok(CompletionResponse {
                text: format!("[R{role}] {kind}"),
                usage: Some(Usage {
                    input_tokens: Some(5),
                    output_tokens: Some(5),
                    total_tokens: Some(10),
                }),
                tool_calls: Vec::new(),
            })
        }
    }

    /// A provider that always returns a fixed JSON payload, for judge
    /// synthesis scenarios.
    pub struct JsonProvider {
        pub payload: String,
    }

    #[async_trait]
    impl ProviderPort for JsonProvider {
        async fn complete(
            &self,
            _req: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                text: self.payload.clone(),
                usage: None,
                tool_calls: Vec::new(),
            })
        }
    }
}

use support::{EchoProvider, JsonProvider};

struct MockSummarizer;

#[async_trait::async_trait]
impl debate_core::Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        req: debate_core::debate::summarizer::SummarizeRequest<'_>,
    ) -> Result<debate_core::debate::summarizer::SummarizeOutcome, debate_core::debate::error::SummarizationError> {
        Ok(debate_core::debate::summarizer::SummarizeOutcome {
            summary: debate_core::debate::summarizer::truncate_chars(&req.content, req.cfg.max_length),
            metadata: debate_core::DebateSummaryMetadata {
                before_chars: req.content.len(),
                after_chars: req.cfg.max_length.min(req.content.len()),
                method: "length-based".into(),
                timestamp: chrono::Utc::now(),
                model: None,
                temperature: None,
                provider: None,
                tokens_used: None,
                latency_ms: None,
            },
        })
    }
}

fn make_agent(
    id: &str,
    role: Role,
    provider: Arc<EchoProvider>,
) -> RoleAgent<EchoProvider> {
    let registry = RolePromptRegistry::with_defaults();
    let prompts = registry.get(role).unwrap().clone();
    RoleAgent::new(
        AgentConfig {
            id: id.into(),
            name: id.into(),
            role,
            model: "mock".into(),
            provider: Provider::Mock,
            temperature: 0.2,
            enabled: true,
        },
        prompts,
        provider,
        Arc::new(MockSummarizer),
    )
}

fn base_cfg(rounds: u32, timeout_ms: u64) -> DebateConfig {
    DebateConfig {
        rounds,
        termination_condition: TerminationCondition::default(),
        synthesis_method: SynthesisMethod::Judge,
        include_full_history: true,
        timeout_per_round_ms: timeout_ms,
        summarization: None,
        trace: None,
    }
}

#[tokio::test]
async fn s1_two_agents_two_rounds_echo_provider() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DebateStore::new(dir.path()).unwrap());
    let provider = Arc::new(EchoProvider::new());
    let a1 = make_agent("a1", Role::Architect, provider.clone());
    let a2 = make_agent("a2", Role::Performance, provider.clone());
    let judge = JudgeAgent::new(
        "mock".into(),
        0.2,
        Provider::Mock,
        provider.clone(),
        Arc::new(MockSummarizer),
    );

    let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());
    let result = orch
        .run(
            "solve x",
            None,
            vec![a1, a2],
            judge,
            base_cfg(2, 300_000),
            HookBus::none(),
            None,
            false,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let state = store.get_debate(&result.debate_id).unwrap().unwrap();
    assert_eq!(state.rounds.len(), 2);
    let round1 = &state.rounds[0];
    assert_eq!(
        round1
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Proposal)
            .count(),
        2
    );
    assert_eq!(
        round1
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Critique)
            .count(),
        2
    );
    assert_eq!(
        round1
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Refinement)
            .count(),
        2
    );
    let has_pair = |from: &str, to: &str| {
        round1.contributions.iter().any(|c| {
            c.kind == ContributionType::Critique
                && c.agent_id == from
                && c.target_agent_id.as_deref() == Some(to)
        })
    };
    assert!(has_pair("a1", "a2"));
    assert!(has_pair("a2", "a1"));

    let round1_refinements: std::collections::HashMap<String, String> = round1
        .contributions
        .iter()
        .filter(|c| c.kind == ContributionType::Refinement)
        .map(|c| (c.agent_id.clone(), c.content.clone()))
        .collect();
    for c in state.rounds[1]
        .contributions
        .iter()
        .filter(|c| c.kind == ContributionType::Proposal)
    {
        assert_eq!(&c.content, round1_refinements.get(&c.agent_id).unwrap());
    }

    assert_eq!(result.solution.confidence, 50);
}

#[tokio::test]
async fn s2_valid_judge_json_preserves_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DebateStore::new(dir.path()).unwrap());
    let echo = Arc::new(EchoProvider::new());
    let json_provider = Arc::new(JsonProvider {
        payload: r#"{"solutionMarkdown":"OK","confidence":82,"unfulfilledMajorRequirements":[]}"#
            .to_string(),
    });
    let a1 = make_agent("a1", Role::Architect, echo.clone());
    let a2 = make_agent("a2", Role::Performance, echo.clone());
    let judge = JudgeAgent::new(
        "mock".into(),
        0.2,
        Provider::Mock,
        json_provider,
        Arc::new(MockSummarizer),
    );

    let orch: Orchestrator<EchoProvider> = Orchestrator::new(store);
    let result = orch
        .run(
            "solve x",
            None,
            vec![a1, a2],
            judge,
            base_cfg(2, 300_000),
            HookBus::none(),
            None,
            false,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.solution.confidence, 82);
    assert!(result.solution.description.contains("OK"));
    assert!(result
        .solution
        .description
        .contains("**Confidence Score**: 82/100"));
}

#[tokio::test]
async fn s5_timeout_marks_debate_failed_with_partial_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DebateStore::new(dir.path()).unwrap());
    let slow = Arc::new(EchoProvider::with_sleep(100));
    let a1 = make_agent("a1", Role::Architect, slow.clone());
    let judge = JudgeAgent::new(
        "mock".into(),
        0.2,
        Provider::Mock,
        slow.clone(),
        Arc::new(MockSummarizer),
    );
    let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());

    let result = orch
        .run(
            "solve x",
            None,
            vec![a1],
            judge,
            base_cfg(1, 1),
            HookBus::none(),
            None,
            false,
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(DebateError::TimeoutError { .. })));

    let debates = store.list_debates().unwrap();
    assert_eq!(debates.len(), 1);
    assert_eq!(debates[0].status, DebateStatus::Failed);
    assert!(debates[0].rounds.len() <= 1);
}

#[tokio::test]
async fn s3_unfulfilled_requirements_cap_confidence_at_40() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DebateStore::new(dir.path()).unwrap());
    let echo = Arc::new(EchoProvider::new());
    let json_provider = Arc::new(JsonProvider {
        payload: r#"{"solutionMarkdown":"Partial","confidence":95,"unfulfilledMajorRequirements":["needs auth"]}"#
            .to_string(),
    });
    let a1 = make_agent("a1", Role::Architect, echo.clone());
    let judge = JudgeAgent::new(
        "mock".into(),
        0.2,
        Provider::Mock,
        json_provider,
        Arc::new(MockSummarizer),
    );

    let orch: Orchestrator<EchoProvider> = Orchestrator::new(store);
    let result = orch
        .run(
            "solve x",
            None,
            vec![a1],
            judge,
            base_cfg(1, 300_000),
            HookBus::none(),
            None,
            false,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.solution.confidence, 40);
    assert!(result
        .solution
        .description
        .contains("Unfulfilled Major Requirements"));
}

#[tokio::test]
async fn s6_summarization_triggers_and_persists_summary() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DebateStore::new(dir.path()).unwrap());
    let provider = Arc::new(EchoProvider::new());
    let a1 = make_agent("a1", Role::Architect, provider.clone());
    let a2 = make_agent("a2", Role::Performance, provider.clone());
    let judge = JudgeAgent::new(
        "mock".into(),
        0.2,
        Provider::Mock,
        provider.clone(),
        Arc::new(MockSummarizer),
    );

    let events = Arc::new(std::sync::Mutex::new(Vec::new()));
    let events_sink = events.clone();
    let hooks = HookBus::new(Some(Box::new(move |event: &DebateHookEvent| {
        events_sink.lock().unwrap().push(format!("{event:?}"));
    })));

    let mut cfg = base_cfg(2, 300_000);
    cfg.summarization = Some(SummarizationConfig {
        enabled: true,
        threshold: 1,
        max_length: 20,
        method: SummarizationMethod::LengthBased,
    });

    let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());
    let result = orch
        .run(
            "solve x",
            None,
            vec![a1, a2],
            judge,
            cfg,
            hooks,
            None,
            false,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let state = store.get_debate(&result.debate_id).unwrap().unwrap();
    // Round 2 onward should carry at least one persisted summary, since
    // round 1 contributions already exceed the threshold of 1 char.
    let has_summary = state
        .rounds
        .iter()
        .any(|r| !r.summaries.is_empty());
    assert!(has_summary);
    for round in &state.rounds {
        for summary in round.summaries.values() {
            assert!(summary.metadata.after_chars <= 20);
        }
    }

    let logged = events.lock().unwrap();
    assert!(logged.iter().any(|e| e.contains("SummarizationStart")));
    assert!(logged.iter().any(|e| e.contains("SummarizationComplete")));
    assert!(logged.iter().any(|e| e.contains("SummarizationEnd")));
}

#[test]
fn s4_missing_clarification_answers_bind_na() {
    let collected = vec![debate_core::AgentClarifications {
        agent_id: "a1".into(),
        items: vec![debate_core::ClarificationItem::new("q1", "Scale?")],
    }];
    let answers = std::collections::HashMap::new();
    let bound = debate_core::bind_answers(collected, &answers);
    assert_eq!(bound[0].items[0].answer.as_deref(), Some("NA"));
}

fn make_contribution(agent_id: &str, kind: ContributionType, content: &str) -> Contribution {
    Contribution {
        agent_id: agent_id.into(),
        agent_role: Role::Architect,
        kind,
        content: content.into(),
        target_agent_id: None,
        metadata: debate_core::ContributionMetadata::default(),
        round: 1,
    }
}

#[test]
fn invariant_critique_always_has_distinct_target() {
    let mut c = make_contribution("a1", ContributionType::Critique, "x");
    assert!(c.validate().is_err());
    c.target_agent_id = Some("a1".into());
    assert!(c.validate().is_err());
    c.target_agent_id = Some("a2".into());
    assert!(c.validate().is_ok());
}
