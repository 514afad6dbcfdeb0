//! Role specialization re-expressed as data: a single role-agnostic agent
//! type is parameterized by a `RolePrompts` record selected from a registry
//! keyed by `Role`, rather than by per-role subclassing.

use std::collections::HashMap;

use crate::debate::model::Role;

/// Opaque prompt templates for one role. Authorship of the text is not
/// this crate's concern; the registry below ships serviceable defaults so
/// the crate runs standalone.
#[derive(Debug, Clone)]
pub struct RolePrompts {
    pub propose_system: String,
    pub critique_system: String,
    pub refine_system: String,
    pub clarify_system: String,
}

impl RolePrompts {
    pub fn system_for(&self, activity: Activity) -> &str {
        match activity {
            Activity::Propose => &self.propose_system,
            Activity::Critique => &self.critique_system,
            Activity::Refine => &self.refine_system,
            Activity::Clarify => &self.clarify_system,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Propose,
    Critique,
    Refine,
    Clarify,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Propose => "propose",
            Activity::Critique => "critique",
            Activity::Refine => "refine",
            Activity::Clarify => "clarify",
        }
    }
}

/// Registry of default prompts, one entry per debating role.
pub struct RolePromptRegistry {
    prompts: HashMap<Role, RolePrompts>,
}

impl RolePromptRegistry {
    pub fn with_defaults() -> Self {
        let mut prompts = HashMap::new();
        for role in [
            Role::Architect,
            Role::Performance,
            Role::Security,
            Role::Testing,
            Role::Generalist,
        ] {
            prompts.insert(role, default_prompts_for(role));
        }
        RolePromptRegistry { prompts }
    }

    pub fn get(&self, role: Role) -> Option<&RolePrompts> {
        self.prompts.get(&role)
    }

    pub fn insert(&mut self, role: Role, prompts: RolePrompts) {
        self.prompts.insert(role, prompts);
    }
}

impl Default for RolePromptRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_prompts_for(role: Role) -> RolePrompts {
    let focus = match role {
        Role::Architect => "system structure, module boundaries, and long-term maintainability",
        Role::Performance => "throughput, latency, and resource usage",
        Role::Security => "attack surface, input validation, and failure isolation",
        Role::Testing => "testability, edge cases, and regression risk",
        Role::Generalist => "overall correctness and pragmatic trade-offs",
        Role::Judge => "synthesizing the debate into a single recommendation",
    };
    RolePrompts {
        propose_system: format!(
            "ROLE:{role} You are a {role} reviewer. Propose a solution to the \
             problem, focusing on {focus}."
        ),
        critique_system: format!(
            "ROLE:{role} You are a {role} reviewer. critique the given proposal, \
             focusing on {focus}."
        ),
        refine_system: format!(
            "ROLE:{role} You are a {role} reviewer. refine your proposal in light \
             of the critiques received, focusing on {focus}."
        ),
        clarify_system: format!(
            "ROLE:{role} You are a {role} reviewer. Ask clarifying questions, if \
             any, needed to address {focus}."
        ),
    }
}
