//! CLI adapter exercising the debate core end-to-end. Thin shell over the
//! library: wires a reqwest-based OpenAI-chat-completions-shaped provider,
//! loads configuration, and runs a debate to completion.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use debate_core::{
    AgentConfig, DebateConfig, HookBus, JudgeAgent, LengthBasedSummarizer, Orchestrator, Provider,
    ProviderError, ProviderPort, RoleAgent, RolePromptRegistry, Role,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a structured multi-agent debate", long_about = None)]
struct Args {
    /// The problem statement to debate.
    #[arg(long)]
    problem: String,

    /// Path to a TOML file describing agents and debate configuration.
    #[arg(long)]
    config: String,

    /// Directory to persist debate state under.
    #[arg(long, default_value = "./debates")]
    state_dir: String,

    /// Base URL of an OpenAI-chat-completions-compatible endpoint.
    #[arg(long, env = "DEBATE_PROVIDER_URL")]
    provider_url: String,

    /// API key for the provider endpoint.
    #[arg(long, env = "DEBATE_PROVIDER_API_KEY")]
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    agents: Vec<AgentFileEntry>,
    judge_model: String,
    #[serde(default)]
    judge_temperature: f32,
    rounds: u32,
    timeout_per_round_ms: u64,
    #[serde(default)]
    include_full_history: bool,
}

#[derive(Debug, Deserialize)]
struct AgentFileEntry {
    id: String,
    name: String,
    role: String,
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

fn default_temperature() -> f32 {
    0.3
}

fn parse_role(s: &str) -> Result<Role> {
    Ok(match s {
        "architect" => Role::Architect,
        "performance" => Role::Performance,
        "security" => Role::Security,
        "testing" => Role::Testing,
        "generalist" => Role::Generalist,
        other => anyhow::bail!("unknown role '{other}'"),
    })
}

/// Reference Provider Port implementation speaking an OpenAI-chat-
/// completions-shaped wire format directly over `reqwest`, in the style of
/// the council members this crate's agents descend from: no SDK, manual
/// JSON request/response handling.
struct HttpProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpProvider {
    fn new(base_url: String, api_key: String) -> Self {
        HttpProvider {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProviderPort for HttpProvider {
    async fn complete(
        &self,
        req: debate_core::CompletionRequest,
    ) -> Result<debate_core::CompletionResponse, ProviderError> {
        let messages = match &req.messages {
            Some(msgs) => msgs
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "role": role_str(m.role),
                        "content": m.content,
                    })
                })
                .collect::<Vec<_>>(),
            None => vec![
                serde_json::json!({"role": "system", "content": req.system_prompt}),
                serde_json::json!({"role": "user", "content": req.user_prompt}),
            ],
        };

        let body = serde_json::json!({
            "model": req.model,
            "temperature": req.temperature,
            "messages": messages,
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Auth("invalid credentials".to_string()));
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "upstream status {}",
                resp.status()
            )));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ProviderError::Schema("missing choices[0].message.content".into()))?
            .to_string();

        let usage = payload.get("usage").map(|u| debate_core::Usage {
            input_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()),
            output_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()),
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()),
        });

        Ok(debate_core::CompletionResponse {
            text,
            usage,
            tool_calls: Vec::new(),
        })
    }
}

fn role_str(role: debate_core::MessageRole) -> &'static str {
    match role {
        debate_core::MessageRole::System => "system",
        debate_core::MessageRole::User => "user",
        debate_core::MessageRole::Assistant => "assistant",
        debate_core::MessageRole::Tool => "tool",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let raw_config = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading config file {}", args.config))?;
    let file_cfg: FileConfig =
        toml::from_str(&raw_config).context("parsing debate config TOML")?;

    let provider = Arc::new(HttpProvider::new(args.provider_url, args.api_key));
    let summarizer = Arc::new(LengthBasedSummarizer::new(provider.clone()));
    let registry = RolePromptRegistry::with_defaults();

    let mut agents = Vec::new();
    for entry in &file_cfg.agents {
        let role = parse_role(&entry.role)?;
        let prompts = registry
            .get(role)
            .with_context(|| format!("no default prompts for role '{}'", entry.role))?
            .clone();
        agents.push(RoleAgent::new(
            AgentConfig {
                id: entry.id.clone(),
                name: entry.name.clone(),
                role,
                model: entry.model.clone(),
                provider: Provider::OpenAi,
                temperature: entry.temperature,
                enabled: true,
            },
            prompts,
            provider.clone(),
            summarizer.clone(),
        ));
    }

    let judge = JudgeAgent::new(
        file_cfg.judge_model,
        file_cfg.judge_temperature,
        Provider::OpenAi,
        provider.clone(),
        summarizer.clone(),
    );

    let cfg = DebateConfig {
        rounds: file_cfg.rounds,
        termination_condition: Default::default(),
        synthesis_method: debate_core::SynthesisMethod::Judge,
        include_full_history: file_cfg.include_full_history,
        timeout_per_round_ms: file_cfg.timeout_per_round_ms,
        summarization: None,
        trace: None,
    };

    let store = Arc::new(debate_core::DebateStore::new(&args.state_dir)?);
    let orchestrator: Orchestrator<HttpProvider> = Orchestrator::new(store);

    let hooks = HookBus::new(Some(Box::new(|event| {
        tracing::info!(?event, "debate progress");
    })));

    let result = orchestrator
        .run(
            &args.problem,
            None,
            agents,
            judge,
            cfg,
            hooks,
            None,
            false,
            CancellationToken::new(),
        )
        .await?;

    println!("debate {} complete", result.debate_id);
    println!("confidence: {}", result.solution.confidence);
    println!("{}", result.solution.description);

    Ok(())
}
