//! The Clarification Phase (C7): pre-round-1 question collection and
//! answer binding. Fans out `AskClarifyingQuestions` across agents
//! concurrently; missing answers bind the literal string `"NA"`.

use std::collections::HashMap;

use futures::future::join_all;

use crate::debate::agent::RoleAgent;
use crate::debate::error::ProviderError;
use crate::debate::model::{AgentClarifications, ClarificationItem, DebateContext};
use crate::debate::provider::ProviderPort;

/// Collects clarifying questions from every agent concurrently, capping
/// each agent's contribution at `max_per_agent` items.
pub async fn collect<P: ProviderPort>(
    problem: &str,
    agents: &[RoleAgent<P>],
    max_per_agent: usize,
    ctx: &DebateContext,
) -> Vec<AgentClarifications> {
    let futures = agents.iter().map(|agent| {
        let problem = problem.to_string();
        let ctx = ctx.clone();
        async move {
            let result = agent.ask_clarifying_questions(&problem, &ctx).await;
            (agent.config().id.clone(), result)
        }
    });

    let results = join_all(futures).await;
    results
        .into_iter()
        .map(|(agent_id, result)| {
            let items = match result {
                Ok(mut questions) => {
                    questions.truncate(max_per_agent);
                    questions
                }
                Err(err) => {
                    tracing::warn!(agent_id = %agent_id, error = %err, "clarifying questions failed");
                    Vec::new()
                }
            };
            AgentClarifications { agent_id, items }
        })
        .collect()
}

/// Binds user-supplied answers (keyed by clarification item id) onto the
/// collected questions; any item without a matching answer is bound to the
/// literal string `"NA"`.
pub fn bind_answers(
    mut collected: Vec<AgentClarifications>,
    answers: &HashMap<String, String>,
) -> Vec<AgentClarifications> {
    for agent_clar in &mut collected {
        for item in &mut agent_clar.items {
            item.answer = Some(
                answers
                    .get(&item.id)
                    .cloned()
                    .unwrap_or_else(|| "NA".to_string()),
            );
        }
    }
    collected
}

pub type ClarificationError = ProviderError;

impl ClarificationItem {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        ClarificationItem {
            id: id.into(),
            question: question.into(),
            answer: None,
        }
    }
}
