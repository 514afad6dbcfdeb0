//! The Progress Hook Bus (C8): ordered, best-effort delivery of lifecycle
//! events to a single subscriber per run. Unlike the broadcast-channel
//! event bus this crate's ancestor used for multi-subscriber replay, a
//! debate run has exactly one caller watching it, so delivery is a direct
//! synchronous callback rather than a channel.

use crate::debate::model::{Contribution, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum Phase {
    Proposal,
    Critique,
    Refinement,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Proposal => "proposal",
            Phase::Critique => "critique",
            Phase::Refinement => "refinement",
        }
    }
}

#[derive(Debug, Clone)]
pub enum DebateHookEvent {
    RoundStart {
        round: u32,
        total: u32,
    },
    PhaseStart {
        round: u32,
        phase: Phase,
        expected_task_count: usize,
    },
    SummarizationStart {
        agent_name: String,
    },
    SummarizationComplete {
        agent_name: String,
        before_chars: usize,
        after_chars: usize,
    },
    SummarizationEnd {
        agent_name: String,
    },
    AgentStart {
        agent_name: String,
        activity: String,
    },
    AgentComplete {
        agent_name: String,
        activity: String,
    },
    ContributionCreated {
        contribution: Contribution,
        round: u32,
    },
    PhaseComplete {
        round: u32,
        phase: Phase,
    },
    SynthesisStart,
    SynthesisComplete,
}

/// A best-effort sink for `DebateHookEvent`s. Handlers must not panic;
/// the bus catches nothing, so misbehaving handlers are a caller bug, not
/// a bus concern — the orchestrator simply calls this synchronously at
/// each emission point in call order, which is sufficient to satisfy the
/// ordering guarantees in the concurrency model.
pub struct HookBus {
    sink: Option<Box<dyn Fn(&DebateHookEvent) + Send + Sync>>,
}

impl HookBus {
    pub fn new(sink: Option<Box<dyn Fn(&DebateHookEvent) + Send + Sync>>) -> Self {
        HookBus { sink }
    }

    pub fn none() -> Self {
        HookBus { sink: None }
    }

    pub fn emit(&self, event: DebateHookEvent) {
        if let Some(sink) = &self.sink {
            sink(&event);
        }
    }
}

pub fn role_label(role: Role) -> String {
    role.as_str().to_string()
}
