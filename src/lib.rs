//! Structured multi-agent debate orchestration over an LLM backend.
//!
//! Several role-specialized agents iterate through proposal, critique, and
//! refinement phases for a configured number of rounds; a judge then
//! synthesizes a final solution with a confidence score. Optional
//! clarification collection precedes round 1.

#![allow(dead_code)]

pub mod debate;

pub use debate::agent::{AgentOutput, NoTools, RoleAgent, ToolExecutor};
pub use debate::clarification::{bind_answers, collect};
pub use debate::error::{DebateError, DebateResult, ParseError, ProviderError, SummarizationError, ToolError};
pub use debate::hooks::{DebateHookEvent, HookBus, Phase};
pub use debate::judge::JudgeAgent;
pub use debate::model::{
    AgentClarifications, AgentConfig, ClarificationItem, Contribution, ContributionMetadata,
    ContributionType, DebateConfig, DebateContext, DebateRound, DebateState, DebateStatus,
    DebateSummary, DebateSummaryMetadata, Provider, Role, Solution, SummarizationConfig,
    SummarizationMethod, SynthesisMethod, TerminationCondition, TerminationConditionType,
};
pub use debate::orchestrator::{DebateResultSummary, Orchestrator};
pub use debate::persistence::{generate_debate_id, DebateStore};
pub use debate::provider::{
    CompletionRequest, CompletionResponse, Message, MessageRole, ProviderPort, ToolCall,
    ToolDescriptor, Usage,
};
pub use debate::roles::{Activity, RolePromptRegistry, RolePrompts};
pub use debate::summarizer::{LengthBasedSummarizer, Summarizer};
pub use debate::tracing_shim::TraceHandle;
