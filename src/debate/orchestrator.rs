//! The Orchestrator (C6): the core debate state machine. Fans out
//! per-agent tasks concurrently within a phase, serializes phases and
//! rounds, threads per-agent context through summarization, carries
//! refinements forward into the next round's proposals, and emits an
//! ordered progress hook stream.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::debate::agent::RoleAgent;
use crate::debate::clarification;
use crate::debate::error::{DebateError, DebateResult};
use crate::debate::hooks::{DebateHookEvent, HookBus, Phase};
use crate::debate::judge::JudgeAgent;
use crate::debate::model::{
    validate_agent_roster, AgentClarifications, AgentConfig, Contribution, ContributionMetadata,
    ContributionType, DebateConfig, DebateContext, DebateRound, Solution,
};
use crate::debate::persistence::DebateStore;
use crate::debate::provider::ProviderPort;
use crate::debate::tracing_shim::TraceHandle;

pub struct DebateResultSummary {
    pub debate_id: String,
    pub solution: Solution,
    pub total_rounds: u32,
    pub total_tokens: Option<u64>,
    pub duration_ms: u64,
}

pub struct Orchestrator<P: ProviderPort> {
    store: Arc<DebateStore>,
    _marker: std::marker::PhantomData<fn() -> P>,
}

impl<P: ProviderPort> Orchestrator<P> {
    /// Builds the `DebateContext` for a single agent call: assembles the
    /// base context from current history/clarifications/cfg, then invokes
    /// the agent's `PrepareContext`. If a summary is produced it is
    /// persisted and emitted bracketed by `SummarizationStart`/`End`.
    #[allow(clippy::too_many_arguments)]
    async fn prepare_agent_context(
        &self,
        id: &str,
        agent: &RoleAgent<P>,
        problem: &str,
        context: &Option<String>,
        history: &[DebateRound],
        clarifications: &Option<Vec<AgentClarifications>>,
        cfg: &DebateConfig,
        round: u32,
        hooks: &HookBus,
    ) -> DebateResult<DebateContext> {
        let base_ctx = DebateContext {
            problem: problem.to_string(),
            context: context.clone(),
            history: history.to_vec(),
            summary: None,
            clarifications: clarifications.clone(),
            include_full_history: cfg.include_full_history,
            tracing_context: cfg.trace.clone(),
        };

        let Some(summarization) = cfg.summarization.as_ref() else {
            return Ok(base_ctx);
        };

        let will_trigger =
            agent.should_summarize(history, summarization.threshold, summarization.enabled);
        if !will_trigger {
            return Ok(base_ctx);
        }

        hooks.emit(DebateHookEvent::SummarizationStart {
            agent_name: agent.config().name.clone(),
        });
        let (ctx, summary) = agent
            .prepare_context(
                base_ctx,
                summarization.enabled,
                summarization.threshold,
                summarization.max_length,
            )
            .await;
        if let Some(summary) = summary {
            hooks.emit(DebateHookEvent::SummarizationComplete {
                agent_name: agent.config().name.clone(),
                before_chars: summary.metadata.before_chars,
                after_chars: summary.metadata.after_chars,
            });
            self.store.add_summary(id, round, summary)?;
        }
        hooks.emit(DebateHookEvent::SummarizationEnd {
            agent_name: agent.config().name.clone(),
        });
        Ok(ctx)
    }

    pub fn new(store: Arc<DebateStore>) -> Self {
        Orchestrator { store, _marker: std::marker::PhantomData }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn run<J: ProviderPort>(
        &self,
        problem: &str,
        context: Option<String>,
        agents: Vec<RoleAgent<P>>,
        judge: JudgeAgent<J>,
        cfg: DebateConfig,
        hooks: HookBus,
        clarifications: Option<Vec<AgentClarifications>>,
        clarifications_enabled: bool,
        cancel: CancellationToken,
    ) -> DebateResult<DebateResultSummary> {
        if problem.trim().is_empty() {
            return Err(DebateError::InvalidInput("problem must not be empty".into()));
        }
        cfg.validate().map_err(DebateError::InvalidInput)?;
        let configs: Vec<AgentConfig> = agents.iter().map(|a| a.config().clone()).collect();
        validate_agent_roster(&configs).map_err(DebateError::InvalidInput)?;

        let started = std::time::Instant::now();
        let id = self.store.create_debate(problem.to_string(), context.clone())?;
        let trace = TraceHandle::from_config(cfg.trace.as_deref(), &id);
        let _run_span = trace.span("run").entered();

        let enabled_agents: Vec<&RoleAgent<P>> =
            agents.iter().filter(|a| a.config().enabled).collect();

        let resolved_clarifications = if let Some(c) = clarifications {
            self.store.set_clarifications(&id, c.clone())?;
            Some(c)
        } else if clarifications_enabled {
            let collected =
                clarification::collect(problem, &agents, 5, &empty_context(problem, &context))
                    .await;
            self.store.set_clarifications(&id, collected.clone())?;
            Some(collected)
        } else {
            None
        };

        let mut total_tokens: u64 = 0;
        let mut had_tokens = false;

        for r in 1..=cfg.rounds {
            if cancel.is_cancelled() {
                self.store.fail_debate(&id);
                return Err(DebateError::Cancelled);
            }
            let round_result = tokio::time::timeout(
                std::time::Duration::from_millis(cfg.timeout_per_round_ms),
                self.run_round(
                    &id,
                    problem,
                    &context,
                    &enabled_agents,
                    r,
                    &cfg,
                    &hooks,
                    &resolved_clarifications,
                    &cancel,
                    &mut total_tokens,
                    &mut had_tokens,
                ),
            )
            .await;

            match round_result {
                Ok(Ok(())) => {}
                Ok(Err(DebateError::Cancelled)) => {
                    self.store.fail_debate(&id);
                    return Err(DebateError::Cancelled);
                }
                Ok(Err(err)) => {
                    self.store.fail_debate(&id);
                    return Err(err);
                }
                Err(_elapsed) => {
                    self.store.fail_debate(&id);
                    return Err(DebateError::TimeoutError {
                        round: r,
                        elapsed_ms: cfg.timeout_per_round_ms,
                    });
                }
            }
        }

        hooks.emit(DebateHookEvent::SynthesisStart);
        let final_state = self
            .store
            .get_debate(&id)?
            .ok_or_else(|| DebateError::NotFound(id.clone()))?;
        let solution = judge
            .synthesize(problem, &final_state.rounds, cfg.summarization.as_ref())
            .await
            .map_err(|e| DebateError::ProviderError(e.to_string()))?;
        self.store.complete_debate(&id, solution.clone())?;
        hooks.emit(DebateHookEvent::SynthesisComplete);

        Ok(DebateResultSummary {
            debate_id: id,
            solution,
            total_rounds: cfg.rounds,
            total_tokens: if had_tokens { Some(total_tokens) } else { None },
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_round(
        &self,
        id: &str,
        problem: &str,
        context: &Option<String>,
        enabled_agents: &[&RoleAgent<P>],
        r: u32,
        cfg: &DebateConfig,
        hooks: &HookBus,
        clarifications: &Option<Vec<AgentClarifications>>,
        cancel: &CancellationToken,
        total_tokens: &mut u64,
        had_tokens: &mut bool,
    ) -> DebateResult<()> {
        self.store.begin_round(id)?;
        hooks.emit(DebateHookEvent::RoundStart { round: r, total: cfg.rounds });

        let history_before_round: Vec<DebateRound> = self
            .store
            .get_debate(id)?
            .ok_or_else(|| DebateError::NotFound(id.to_string()))?
            .rounds
            .into_iter()
            .filter(|round| round.round_number < r)
            .collect();

        // Proposal phase. Round 1 requires a fresh proposal from every
        // enabled agent; later rounds carry each agent's prior refinement
        // forward verbatim (no provider call, no AgentStart/AgentComplete)
        // unless it is missing, in which case a fresh proposal is requested.
        // `expected_task_count` reflects only the fresh-proposal fan-out,
        // since that is the only source of AgentStart/AgentComplete events.
        let (carried_forward, needs_fresh_propose) =
            self.split_carry_forward(enabled_agents, r, &history_before_round)?;

        hooks.emit(DebateHookEvent::PhaseStart {
            round: r,
            phase: Phase::Proposal,
            expected_task_count: needs_fresh_propose.len(),
        });
        let fresh = self
            .fan_out_propose(
                id, problem, context, &needs_fresh_propose, r, cfg, hooks, clarifications,
                cancel, total_tokens, had_tokens, &history_before_round,
            )
            .await?;

        let mut by_id: HashMap<String, Contribution> = HashMap::new();
        for (agent, contribution) in carried_forward.into_iter().chain(fresh.into_iter()) {
            by_id.insert(agent.config().id.clone(), contribution);
        }
        let proposals: Vec<Contribution> = enabled_agents
            .iter()
            .filter_map(|a| by_id.remove(&a.config().id))
            .collect();
        for contribution in proposals {
            self.store.add_contribution(id, contribution.clone())?;
            hooks.emit(DebateHookEvent::ContributionCreated { contribution, round: r });
        }
        hooks.emit(DebateHookEvent::PhaseComplete { round: r, phase: Phase::Proposal });

        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }

        // Critique phase: every ordered (critic, target) pair, critic != target.
        let state = self.store.get_debate(id)?.ok_or_else(|| DebateError::NotFound(id.to_string()))?;
        let current_round = state.rounds.last().cloned().ok_or_else(|| DebateError::NoActiveRound(id.to_string()))?;
        let proposal_by_agent: HashMap<String, String> = current_round
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Proposal)
            .map(|c| (c.agent_id.clone(), c.content.clone()))
            .collect();

        let mut pairs: Vec<(&RoleAgent<P>, &RoleAgent<P>)> = Vec::new();
        for critic in enabled_agents {
            for target in enabled_agents {
                if critic.config().id != target.config().id {
                    pairs.push((critic, target));
                }
            }
        }
        pairs.sort_by(|a, b| {
            (a.0.config().id.as_str(), a.1.config().id.as_str())
                .cmp(&(b.0.config().id.as_str(), b.1.config().id.as_str()))
        });

        hooks.emit(DebateHookEvent::PhaseStart {
            round: r,
            phase: Phase::Critique,
            expected_task_count: pairs.len(),
        });
        let critiques = self
            .run_critique_phase(
                id, problem, context, r, cfg, hooks, clarifications, cancel, &pairs,
                &proposal_by_agent, total_tokens, had_tokens, &history_before_round,
            )
            .await?;
        for contribution in &critiques {
            self.store.add_contribution(id, contribution.clone())?;
            hooks.emit(DebateHookEvent::ContributionCreated {
                contribution: contribution.clone(),
                round: r,
            });
        }
        hooks.emit(DebateHookEvent::PhaseComplete { round: r, phase: Phase::Critique });

        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }

        // Refinement phase.
        hooks.emit(DebateHookEvent::PhaseStart {
            round: r,
            phase: Phase::Refinement,
            expected_task_count: enabled_agents.len(),
        });
        let refinements = self
            .run_refinement_phase(
                id, problem, context, enabled_agents, r, cfg, hooks, clarifications, cancel,
                &proposal_by_agent, &critiques, total_tokens, had_tokens,
                &history_before_round,
            )
            .await?;
        for contribution in refinements {
            self.store.add_contribution(id, contribution.clone())?;
            hooks.emit(DebateHookEvent::ContributionCreated { contribution, round: r });
        }
        hooks.emit(DebateHookEvent::PhaseComplete { round: r, phase: Phase::Refinement });

        Ok(())
    }

    /// Splits `enabled_agents` into those whose round `r-1` refinement
    /// carries forward verbatim as round `r`'s proposal, and those that need
    /// a fresh `propose` call (round 1, or a missing prior refinement).
    fn split_carry_forward<'a>(
        &self,
        enabled_agents: &[&'a RoleAgent<P>],
        r: u32,
        history: &[DebateRound],
    ) -> DebateResult<(Vec<(&'a RoleAgent<P>, Contribution)>, Vec<&'a RoleAgent<P>>)> {
        if r == 1 {
            return Ok((Vec::new(), enabled_agents.to_vec()));
        }

        let prior = history
            .iter()
            .find(|round| round.round_number == r - 1)
            .ok_or_else(|| DebateError::InvalidInput(format!("missing round {}", r - 1)))?;

        let mut carried_forward = Vec::new();
        let mut needs_fresh_propose: Vec<&'a RoleAgent<P>> = Vec::new();
        for agent in enabled_agents {
            match prior.refinement_for(&agent.config().id) {
                Some(refinement) => {
                    carried_forward.push((
                        *agent,
                        Contribution {
                            agent_id: agent.config().id.clone(),
                            agent_role: agent.config().role,
                            kind: ContributionType::Proposal,
                            content: refinement.content.clone(),
                            target_agent_id: None,
                            metadata: ContributionMetadata {
                                latency_ms: 0,
                                tokens_used: Some(0),
                                model: refinement.metadata.model.clone(),
                                tool_calls: Vec::new(),
                                tool_results: Vec::new(),
                            },
                            round: r,
                        },
                    ));
                }
                None => {
                    tracing::warn!(agent_id = %agent.config().id, round = r, "missing refinement from prior round; falling back to fresh proposal");
                    needs_fresh_propose.push(*agent);
                }
            }
        }
        Ok((carried_forward, needs_fresh_propose))
    }

    #[allow(clippy::too_many_arguments)]
    async fn fan_out_propose<'a>(
        &self,
        id: &str,
        problem: &str,
        context: &Option<String>,
        agents: &[&'a RoleAgent<P>],
        r: u32,
        cfg: &DebateConfig,
        hooks: &HookBus,
        clarifications: &Option<Vec<AgentClarifications>>,
        cancel: &CancellationToken,
        total_tokens: &mut u64,
        had_tokens: &mut bool,
        history: &[DebateRound],
    ) -> DebateResult<Vec<(&'a RoleAgent<P>, Contribution)>> {
        if agents.is_empty() {
            return Ok(Vec::new());
        }
        let mut contexts = Vec::with_capacity(agents.len());
        for agent in agents {
            let ctx = self
                .prepare_agent_context(id, agent, problem, context, history, clarifications, cfg, r, hooks)
                .await?;
            contexts.push(ctx);
        }
        let tasks = agents.iter().zip(contexts.into_iter()).map(|(agent, ctx)| {
            let problem = problem.to_string();
            hooks.emit(DebateHookEvent::AgentStart {
                agent_name: agent.config().name.clone(),
                activity: "propose".to_string(),
            });
            async move {
                let result = agent.propose(&problem, &ctx).await;
                (*agent, result)
            }
        });
        let results = join_all(tasks).await;
        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }
        let mut out = Vec::new();
        for (agent, result) in results {
            hooks.emit(DebateHookEvent::AgentComplete {
                agent_name: agent.config().name.clone(),
                activity: "propose".to_string(),
            });
            let output = result.map_err(|e| DebateError::ProviderError(e.to_string()))?;
            if let Some(tokens) = output.metadata.tokens_used {
                *total_tokens += tokens;
                *had_tokens = true;
            }
            out.push((
                agent,
                Contribution {
                    agent_id: agent.config().id.clone(),
                    agent_role: agent.config().role,
                    kind: ContributionType::Proposal,
                    content: output.content,
                    target_agent_id: None,
                    metadata: output.metadata,
                    round: r,
                },
            ));
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_critique_phase<'a>(
        &self,
        id: &str,
        problem: &str,
        context: &Option<String>,
        r: u32,
        cfg: &DebateConfig,
        hooks: &HookBus,
        clarifications: &Option<Vec<AgentClarifications>>,
        cancel: &CancellationToken,
        pairs: &[(&'a RoleAgent<P>, &'a RoleAgent<P>)],
        proposal_by_agent: &HashMap<String, String>,
        total_tokens: &mut u64,
        had_tokens: &mut bool,
        history: &[DebateRound],
    ) -> DebateResult<Vec<Contribution>> {
        let mut contexts = Vec::with_capacity(pairs.len());
        for (critic, _target) in pairs {
            let ctx = self
                .prepare_agent_context(id, critic, problem, context, history, clarifications, cfg, r, hooks)
                .await?;
            contexts.push(ctx);
        }
        let tasks = pairs.iter().zip(contexts.into_iter()).map(|((critic, target), ctx)| {
            let target_proposal = proposal_by_agent
                .get(&target.config().id)
                .cloned()
                .unwrap_or_default();
            hooks.emit(DebateHookEvent::AgentStart {
                agent_name: critic.config().name.clone(),
                activity: "critique".to_string(),
            });
            async move {
                let result = critic.critique(&target_proposal, &ctx).await;
                (*critic, *target, result)
            }
        });
        let results = join_all(tasks).await;
        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }
        let mut out = Vec::with_capacity(results.len());
        for (critic, target, result) in results {
            hooks.emit(DebateHookEvent::AgentComplete {
                agent_name: critic.config().name.clone(),
                activity: "critique".to_string(),
            });
            let output = result.map_err(|e| DebateError::ProviderError(e.to_string()))?;
            if let Some(tokens) = output.metadata.tokens_used {
                *total_tokens += tokens;
                *had_tokens = true;
            }
            out.push(Contribution {
                agent_id: critic.config().id.clone(),
                agent_role: critic.config().role,
                kind: ContributionType::Critique,
                content: output.content,
                target_agent_id: Some(target.config().id.clone()),
                metadata: output.metadata,
                round: r,
            });
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_refinement_phase<'a>(
        &self,
        id: &str,
        problem: &str,
        context: &Option<String>,
        enabled_agents: &[&'a RoleAgent<P>],
        r: u32,
        cfg: &DebateConfig,
        hooks: &HookBus,
        clarifications: &Option<Vec<AgentClarifications>>,
        cancel: &CancellationToken,
        proposal_by_agent: &HashMap<String, String>,
        critiques: &[Contribution],
        total_tokens: &mut u64,
        had_tokens: &mut bool,
        history: &[DebateRound],
    ) -> DebateResult<Vec<Contribution>> {
        let mut contexts = Vec::with_capacity(enabled_agents.len());
        for agent in enabled_agents {
            let ctx = self
                .prepare_agent_context(id, agent, problem, context, history, clarifications, cfg, r, hooks)
                .await?;
            contexts.push(ctx);
        }
        let tasks = enabled_agents.iter().zip(contexts.into_iter()).map(|(agent, ctx)| {
            let own_proposal = proposal_by_agent
                .get(&agent.config().id)
                .cloned()
                .unwrap_or_default();
            let own_critiques: Vec<&Contribution> = critiques
                .iter()
                .filter(|c| c.target_agent_id.as_deref() == Some(agent.config().id.as_str()))
                .collect();
            hooks.emit(DebateHookEvent::AgentStart {
                agent_name: agent.config().name.clone(),
                activity: "refine".to_string(),
            });
            async move {
                let result = agent.refine(&own_proposal, &own_critiques, &ctx).await;
                (*agent, result)
            }
        });
        let results = join_all(tasks).await;
        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }
        let mut out = Vec::with_capacity(results.len());
        for (agent, result) in results {
            hooks.emit(DebateHookEvent::AgentComplete {
                agent_name: agent.config().name.clone(),
                activity: "refine".to_string(),
            });
            let output = result.map_err(|e| DebateError::ProviderError(e.to_string()))?;
            if let Some(tokens) = output.metadata.tokens_used {
                *total_tokens += tokens;
                *had_tokens = true;
            }
            out.push(Contribution {
                agent_id: agent.config().id.clone(),
                agent_role: agent.config().role,
                kind: ContributionType::Refinement,
                content: output.content,
                target_agent_id: None,
                metadata: output.metadata,
                round: r,
            });
        }
        Ok(out)
    }
}

fn empty_context(problem: &str, context: &Option<String>) -> DebateContext {
    DebateContext {
        problem: problem.to_string(),
        context: context.clone(),
        history: Vec::new(),
        summary: None,
        clarifications: None,
        include_full_history: true,
        tracing_context: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::model::{DebateStatus, Provider, Role, SummarizationConfig, SummarizationMethod, TerminationCondition, TerminationConditionType, SynthesisMethod};
    use crate::debate::provider::test_support::EchoProvider;
    use crate::debate::roles::RolePromptRegistry;
    use crate::debate::summarizer::MockSummarizer;

    fn agent_config(id: &str, role: Role) -> AgentConfig {
        AgentConfig {
            id: id.into(),
            name: id.into(),
            role,
            model: "mock".into(),
            provider: Provider::Mock,
            temperature: 0.2,
            enabled: true,
        }
    }

    fn make_agent(id: &str, role: Role, provider: Arc<EchoProvider>) -> RoleAgent<EchoProvider> {
        let registry = RolePromptRegistry::with_defaults();
        let prompts = registry.get(role).unwrap().clone();
        let summarizer = Arc::new(MockSummarizer {
            fixed_summary: "s".into(),
            should_fail: false,
        });
        RoleAgent::new(agent_config(id, role), prompts, provider, summarizer)
    }

    fn cfg(rounds: u32, timeout_ms: u64) -> DebateConfig {
        DebateConfig {
            rounds,
            termination_condition: TerminationCondition {
                kind: TerminationConditionType::Fixed,
                threshold: None,
            },
            synthesis_method: SynthesisMethod::Judge,
            include_full_history: true,
            timeout_per_round_ms: timeout_ms,
            summarization: None,
            trace: None,
        }
    }

    #[tokio::test]
    async fn two_round_run_carries_refinement_forward_as_proposal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DebateStore::new(dir.path()).unwrap());
        let provider = Arc::new(EchoProvider::new());
        let a1 = make_agent("a1", Role::Architect, provider.clone());
        let a2 = make_agent("a2", Role::Performance, provider.clone());
        let summarizer = Arc::new(MockSummarizer { fixed_summary: "s".into(), should_fail: false });
        let judge = JudgeAgent::new("mock".into(), 0.2, Provider::Mock, provider.clone(), summarizer);

        let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());
        let result = orch
            .run(
                "solve x",
                None,
                vec![a1, a2],
                judge,
                cfg(2, 300_000),
                HookBus::none(),
                None,
                false,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let state = store.get_debate(&result.debate_id).unwrap().unwrap();
        assert_eq!(state.rounds.len(), 2);
        assert_eq!(state.rounds[0].contributions.iter().filter(|c| c.kind == ContributionType::Proposal).count(), 2);
        assert_eq!(state.rounds[0].contributions.iter().filter(|c| c.kind == ContributionType::Critique).count(), 2);
        assert_eq!(state.rounds[0].contributions.iter().filter(|c| c.kind == ContributionType::Refinement).count(), 2);

        let round1_refinements: HashMap<String, String> = state.rounds[0]
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Refinement)
            .map(|c| (c.agent_id.clone(), c.content.clone()))
            .collect();
        for c in state.rounds[1].contributions.iter().filter(|c| c.kind == ContributionType::Proposal) {
            assert_eq!(&c.content, round1_refinements.get(&c.agent_id).unwrap());
            assert_eq!(c.metadata.tokens_used, Some(0));
            assert_eq!(c.metadata.latency_ms, 0);
        }
        assert_eq!(state.status, DebateStatus::Completed);
        assert_eq!(result.solution.confidence, 50);
    }

    #[tokio::test]
    async fn timeout_marks_debate_failed_with_partial_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DebateStore::new(dir.path()).unwrap());
        let slow_provider = Arc::new(EchoProvider::with_sleep(100));
        let a1 = make_agent("a1", Role::Architect, slow_provider.clone());
        let summarizer = Arc::new(MockSummarizer { fixed_summary: "s".into(), should_fail: false });
        let judge = JudgeAgent::new("mock".into(), 0.2, Provider::Mock, slow_provider.clone(), summarizer);
        let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());

        let result = orch
            .run(
                "solve x",
                None,
                vec![a1],
                judge,
                cfg(1, 1),
                HookBus::none(),
                None,
                false,
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(DebateError::TimeoutError { .. })));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_state_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DebateStore::new(dir.path()).unwrap());
        let provider = Arc::new(EchoProvider::new());
        let a1 = make_agent("a1", Role::Architect, provider.clone());
        let summarizer = Arc::new(MockSummarizer { fixed_summary: "s".into(), should_fail: false });
        let judge = JudgeAgent::new("mock".into(), 0.2, Provider::Mock, provider.clone(), summarizer);
        let orch: Orchestrator<EchoProvider> = Orchestrator::new(store.clone());

        let result = orch
            .run(
                "",
                None,
                vec![a1],
                judge,
                cfg(1, 1000),
                HookBus::none(),
                None,
                false,
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(DebateError::InvalidInput(_))));
        assert!(store.list_debates().unwrap().is_empty());
    }

    #[test]
    fn unused_enum_variants_are_reachable() {
        let _ = SummarizationMethod::LengthBased;
        let _ = SummarizationConfig {
            enabled: true,
            threshold: 1,
            max_length: 1,
            method: SummarizationMethod::LengthBased,
        };
    }
}
