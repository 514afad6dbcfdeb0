//! The Role Agent (C3): a single role-agnostic agent type parameterized by
//! a `RolePrompts` record, encapsulating propose/critique/refine/summarize/
//! clarify over the Provider Port.

use async_trait::async_trait;
use std::sync::Arc;

use crate::debate::error::ProviderError;
use crate::debate::model::{
    AgentConfig, ClarificationItem, Contribution, ContributionMetadata, ContributionType,
    DebateContext, DebateRound, DebateSummary, Role, ToolCallRecord, ToolResultRecord,
};
use crate::debate::provider::{CompletionRequest, Message, ProviderPort, ToolDescriptor};
use crate::debate::roles::{Activity, RolePrompts};
use crate::debate::summarizer::{SummarizeOutcome, SummarizeRequest, Summarizer};

const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;

/// Output of a single operation call, before the orchestrator wraps it into
/// a persisted `Contribution`.
pub struct AgentOutput {
    pub content: String,
    pub metadata: ContributionMetadata,
}

/// A local tool registry the agent's tool-calling loop executes against, with
/// an optional read-only view of debate state.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments_json: &str) -> Result<String, String>;
    fn tools(&self) -> Vec<ToolDescriptor> {
        Vec::new()
    }
}

/// A `ToolExecutor` with no tools, used whenever an agent's config does not
/// wire in a registry.
pub struct NoTools;

#[async_trait]
impl ToolExecutor for NoTools {
    async fn execute(&self, name: &str, _arguments_json: &str) -> Result<String, String> {
        Err(format!("no tool named '{name}' is registered"))
    }
}

pub struct RoleAgent<P: ProviderPort> {
    config: AgentConfig,
    prompts: RolePrompts,
    provider: Arc<P>,
    summarizer: Arc<dyn Summarizer>,
    tools: Arc<dyn ToolExecutor>,
    max_tool_iterations: usize,
}

impl<P: ProviderPort> RoleAgent<P> {
    pub fn new(
        config: AgentConfig,
        prompts: RolePrompts,
        provider: Arc<P>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        RoleAgent {
            config,
            prompts,
            provider,
            summarizer,
            tools: Arc::new(NoTools),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn user_prompt_for_history(&self, problem: &str, ctx: &DebateContext) -> String {
        let mut sections = vec![format!("Problem:\n{problem}")];
        if let Some(context) = &ctx.context {
            sections.push(format!("Context:\n{context}"));
        }
        if let Some(clar) = &ctx.clarifications {
            sections.push(render_clarifications(clar));
        }
        if ctx.include_full_history {
            sections.push(render_full_history(&ctx.history));
        } else if let Some(summary) = &ctx.summary {
            sections.push(format!("Your prior summary:\n{}", summary.summary));
        } else {
            sections.push(render_full_history(&ctx.history));
        }
        sections.join("\n\n")
    }

    async fn run_completion(
        &self,
        system_prompt: String,
        user_prompt: String,
    ) -> Result<(String, ContributionMetadata), ProviderError> {
        let started = std::time::Instant::now();
        let mut messages = vec![
            Message::system(system_prompt),
            Message::user(user_prompt),
        ];
        let tool_descriptors = self.tools.tools();
        let mut tool_calls_log = Vec::new();
        let mut tool_results_log = Vec::new();
        let mut last_text = String::new();
        let mut tokens_used: Option<u64> = None;

        for _ in 0..self.max_tool_iterations {
            let response = self
                .provider
                .complete(CompletionRequest {
                    model: self.config.model.clone(),
                    temperature: self.config.temperature,
                    system_prompt: String::new(),
                    user_prompt: String::new(),
                    messages: Some(messages.clone()),
                    max_tokens: None,
                    stop_sequences: Vec::new(),
                    tools: tool_descriptors.clone(),
                })
                .await?;
            last_text = response.text.clone();
            if let Some(turn_tokens) = response.usage.as_ref().and_then(|u| u.total_tokens) {
                tokens_used = Some(tokens_used.unwrap_or(0) + turn_tokens);
            }
            if response.tool_calls.is_empty() {
                break;
            }
            messages.push(Message::assistant(response.text.clone()));
            for call in &response.tool_calls {
                tool_calls_log.push(ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments_json: call.arguments_json.clone(),
                });
                let (content, is_error) = match self
                    .tools
                    .execute(&call.name, &call.arguments_json)
                    .await
                {
                    Ok(out) => (out, false),
                    Err(err) => (err, true),
                };
                tool_results_log.push(ToolResultRecord {
                    tool_call_id: call.id.clone(),
                    content: content.clone(),
                    is_error,
                });
                messages.push(Message::tool(call.id.clone(), content));
            }
        }

        Ok((
            last_text,
            ContributionMetadata {
                latency_ms: started.elapsed().as_millis() as u64,
                tokens_used,
                model: self.config.model.clone(),
                tool_calls: tool_calls_log,
                tool_results: tool_results_log,
            },
        ))
    }

    pub async fn propose(
        &self,
        problem: &str,
        ctx: &DebateContext,
    ) -> Result<AgentOutput, ProviderError> {
        let system = self.prompts.system_for(Activity::Propose).to_string();
        let user = self.user_prompt_for_history(problem, ctx);
        let (content, metadata) = self.run_completion(system, user).await?;
        Ok(AgentOutput { content, metadata })
    }

    pub async fn critique(
        &self,
        target_proposal: &str,
        ctx: &DebateContext,
    ) -> Result<AgentOutput, ProviderError> {
        let system = self.prompts.system_for(Activity::Critique).to_string();
        let mut user = self.user_prompt_for_history(&ctx.problem, ctx);
        user.push_str(&format!("\n\nProposal under review:\n{target_proposal}"));
        let (content, metadata) = self.run_completion(system, user).await?;
        Ok(AgentOutput { content, metadata })
    }

    pub async fn refine(
        &self,
        original: &str,
        critiques: &[&Contribution],
        ctx: &DebateContext,
    ) -> Result<AgentOutput, ProviderError> {
        let system = self.prompts.system_for(Activity::Refine).to_string();
        let mut user = self.user_prompt_for_history(&ctx.problem, ctx);
        user.push_str(&format!("\n\nYour proposal:\n{original}"));
        if !critiques.is_empty() {
            let joined = critiques
                .iter()
                .map(|c| format!("- {}", c.content))
                .collect::<Vec<_>>()
                .join("\n");
            user.push_str(&format!("\n\nCritiques received:\n{joined}"));
        }
        let (content, metadata) = self.run_completion(system, user).await?;
        Ok(AgentOutput { content, metadata })
    }

    pub async fn ask_clarifying_questions(
        &self,
        problem: &str,
        ctx: &DebateContext,
    ) -> Result<Vec<ClarificationItem>, ProviderError> {
        let system = self.prompts.system_for(Activity::Clarify).to_string();
        let user = format!("Problem:\n{problem}\n\nList clarifying questions, one per line.");
        let _ = ctx;
        let (content, _) = self.run_completion(system, user).await?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, q)| ClarificationItem::new(format!("q{}", i + 1), q))
            .collect())
    }

    /// True iff summarization is enabled, history is non-empty, and the
    /// total character count of this agent's own proposals and refinements
    /// across all prior rounds meets the configured threshold. Critiques
    /// never count toward this trigger, regardless of target.
    pub fn should_summarize(&self, history: &[DebateRound], threshold: usize, enabled: bool) -> bool {
        if !enabled || history.is_empty() {
            return false;
        }
        let own_chars: usize = history
            .iter()
            .flat_map(|r| r.contributions.iter())
            .filter(|c| {
                c.agent_id == self.config.id
                    && matches!(
                        c.kind,
                        ContributionType::Proposal | ContributionType::Refinement
                    )
            })
            .map(|c| c.content.len())
            .sum();
        own_chars >= threshold
    }

    /// If summarization does not trigger, returns `ctx` unchanged with no
    /// summary. Otherwise summarizes this agent's proposals, refinements,
    /// and critiques received, falling back to full history on failure.
    pub async fn prepare_context(
        &self,
        mut ctx: DebateContext,
        summarization_enabled: bool,
        threshold: usize,
        max_length: usize,
    ) -> (DebateContext, Option<DebateSummary>) {
        if !self.should_summarize(&ctx.history, threshold, summarization_enabled) {
            return (ctx, None);
        }
        let own_content = own_contributions_for_summary(&ctx.history, &self.config.id);
        let cfg = crate::debate::model::SummarizationConfig {
            enabled: summarization_enabled,
            threshold,
            max_length,
            method: crate::debate::model::SummarizationMethod::LengthBased,
        };
        let req = SummarizeRequest {
            content: own_content.clone(),
            role: self.config.role,
            cfg: &cfg,
            system_prompt: "Summarize the following debate history concisely.".to_string(),
            user_prompt: own_content,
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            provider: self.config.provider,
        };
        match self.summarizer.summarize(req).await {
            Ok(SummarizeOutcome { summary, metadata }) => {
                let summary = DebateSummary {
                    agent_id: self.config.id.clone(),
                    agent_role: self.config.role,
                    summary,
                    metadata,
                };
                ctx.summary = Some(summary.clone());
                (ctx, Some(summary))
            }
            Err(err) => {
                tracing::warn!(agent_id = %self.config.id, error = %err, "summarization failed; falling back to full history");
                (ctx, None)
            }
        }
    }
}

fn own_contributions_for_summary(history: &[DebateRound], agent_id: &str) -> String {
    history
        .iter()
        .flat_map(|r| r.contributions.iter())
        .filter(|c| {
            c.agent_id == agent_id
                && matches!(
                    c.kind,
                    ContributionType::Proposal | ContributionType::Refinement
                )
        })
        .chain(
            history
                .iter()
                .flat_map(|r| r.contributions.iter())
                .filter(|c| {
                    c.kind == ContributionType::Critique
                        && c.target_agent_id.as_deref() == Some(agent_id)
                }),
        )
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_full_history(history: &[DebateRound]) -> String {
    if history.is_empty() {
        return "No prior rounds.".to_string();
    }
    let mut out = String::new();
    for round in history {
        out.push_str(&format!("== Round {} ==\n", round.round_number));
        for c in &round.contributions {
            out.push_str(&format!("[{}:{}] {}\n", c.agent_id, kind_label(c.kind), c.content));
        }
    }
    out
}

fn kind_label(kind: ContributionType) -> &'static str {
    match kind {
        ContributionType::Proposal => "proposal",
        ContributionType::Critique => "critique",
        ContributionType::Refinement => "refinement",
    }
}

fn render_clarifications(clar: &[crate::debate::model::AgentClarifications]) -> String {
    let mut out = String::from("Clarifications:\n");
    for agent_clar in clar {
        for item in &agent_clar.items {
            out.push_str(&format!(
                "- {}: {}\n",
                item.question,
                item.answer.as_deref().unwrap_or("NA")
            ));
        }
    }
    out
}
