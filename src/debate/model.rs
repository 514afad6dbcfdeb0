//! Data model for a debate: configuration, persisted state, and the
//! per-call context handed to agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current on-disk schema version for `DebateState`, bumped whenever the
/// persisted shape changes in a way that requires migration-aware loading.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Architect,
    Performance,
    Security,
    Testing,
    Generalist,
    Judge,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Architect => "architect",
            Role::Performance => "performance",
            Role::Security => "security",
            Role::Testing => "testing",
            Role::Generalist => "generalist",
            Role::Judge => "judge",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
    Mock,
}

/// Configuration for a single debating agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub model: String,
    pub provider: Provider,
    pub temperature: f32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl AgentConfig {
    /// Validates the invariants on this config in isolation (uniqueness
    /// across a debate's agent set is checked by the caller).
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("agent id must not be empty".into());
        }
        if self.name.trim().is_empty() {
            return Err("agent name must not be empty".into());
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "agent '{}' temperature {} out of range [0,1]",
                self.id, self.temperature
            ));
        }
        Ok(())
    }
}

/// Validates a full agent roster: each config individually, plus id/name
/// uniqueness across the set.
pub fn validate_agent_roster(agents: &[AgentConfig]) -> Result<(), String> {
    if agents.is_empty() {
        return Err("agent roster must not be empty".into());
    }
    let mut ids = std::collections::HashSet::new();
    let mut names = std::collections::HashSet::new();
    for a in agents {
        a.validate()?;
        if !ids.insert(a.id.as_str()) {
            return Err(format!("duplicate agent id '{}'", a.id));
        }
        if !names.insert(a.name.as_str()) {
            return Err(format!("duplicate agent name '{}'", a.name));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationConditionType {
    Fixed,
    Convergence,
    Quality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationCondition {
    #[serde(rename = "type")]
    pub kind: TerminationConditionType,
    pub threshold: Option<f32>,
}

impl Default for TerminationCondition {
    fn default() -> Self {
        TerminationCondition {
            kind: TerminationConditionType::Fixed,
            threshold: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMethod {
    Judge,
    Voting,
    Merge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizationMethod {
    LengthBased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    pub enabled: bool,
    pub threshold: usize,
    pub max_length: usize,
    #[serde(default = "default_summarization_method")]
    pub method: SummarizationMethod,
}

fn default_summarization_method() -> SummarizationMethod {
    SummarizationMethod::LengthBased
}

impl SummarizationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_length == 0 {
            return Err("summarization.maxLength must be > 0".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    pub rounds: u32,
    #[serde(default)]
    pub termination_condition: TerminationCondition,
    #[serde(default = "default_synthesis_method")]
    pub synthesis_method: SynthesisMethod,
    #[serde(default)]
    pub include_full_history: bool,
    pub timeout_per_round_ms: u64,
    pub summarization: Option<SummarizationConfig>,
    pub trace: Option<String>,
}

fn default_synthesis_method() -> SynthesisMethod {
    SynthesisMethod::Judge
}

impl DebateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.rounds < 1 {
            return Err("rounds must be >= 1".into());
        }
        if self.timeout_per_round_ms == 0 {
            return Err("timeoutPerRound must be > 0".into());
        }
        if let Some(s) = &self.summarization {
            s.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    Proposal,
    Critique,
    Refinement,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContributionMetadata {
    pub latency_ms: u64,
    pub tokens_used: Option<u64>,
    pub model: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default)]
    pub tool_results: Vec<ToolResultRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultRecord {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub agent_id: String,
    pub agent_role: Role,
    #[serde(rename = "type")]
    pub kind: ContributionType,
    pub content: String,
    pub target_agent_id: Option<String>,
    pub metadata: ContributionMetadata,
    /// Denormalized for query convenience only; the round's own
    /// `round_number` remains the source of truth for ordering.
    pub round: u32,
}

impl Contribution {
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == ContributionType::Critique {
            match &self.target_agent_id {
                None => return Err("critique contribution missing targetAgentId".into()),
                Some(t) if t == &self.agent_id => {
                    return Err("critique targetAgentId must differ from agentId".into())
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSummaryMetadata {
    pub before_chars: usize,
    pub after_chars: usize,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub provider: Option<Provider>,
    pub tokens_used: Option<u64>,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSummary {
    pub agent_id: String,
    pub agent_role: Role,
    pub summary: String,
    pub metadata: DebateSummaryMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    pub round_number: u32,
    pub contributions: Vec<Contribution>,
    pub summaries: HashMap<String, DebateSummary>,
    pub timestamp: DateTime<Utc>,
}

impl DebateRound {
    pub fn new(round_number: u32) -> Self {
        DebateRound {
            round_number,
            contributions: Vec::new(),
            summaries: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn refinement_for(&self, agent_id: &str) -> Option<&Contribution> {
        self.contributions
            .iter()
            .find(|c| c.kind == ContributionType::Refinement && c.agent_id == agent_id)
    }

    pub fn critiques_targeting(&self, agent_id: &str) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| {
                c.kind == ContributionType::Critique
                    && c.target_agent_id.as_deref() == Some(agent_id)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub description: String,
    pub tradeoffs: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: u8,
    pub synthesized_by: String,
    pub unfulfilled_major_requirements: Vec<String>,
    pub open_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationItem {
    pub id: String,
    pub question: String,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentClarifications {
    pub agent_id: String,
    pub items: Vec<ClarificationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: String,
    pub problem: String,
    pub context: Option<String>,
    pub status: DebateStatus,
    pub current_round: u32,
    pub rounds: Vec<DebateRound>,
    pub clarifications: Option<Vec<AgentClarifications>>,
    pub final_solution: Option<Solution>,
    pub user_feedback: Option<i8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl DebateState {
    pub fn new(id: String, problem: String, context: Option<String>) -> Self {
        let now = Utc::now();
        DebateState {
            schema_version: CURRENT_SCHEMA_VERSION,
            id,
            problem,
            context,
            status: DebateStatus::Pending,
            current_round: 0,
            rounds: Vec::new(),
            clarifications: None,
            final_solution: None,
            user_feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Transient, non-persisted context threaded to an agent for a single call.
#[derive(Debug, Clone)]
pub struct DebateContext {
    pub problem: String,
    pub context: Option<String>,
    pub history: Vec<DebateRound>,
    pub summary: Option<DebateSummary>,
    pub clarifications: Option<Vec<AgentClarifications>>,
    pub include_full_history: bool,
    pub tracing_context: Option<String>,
}
