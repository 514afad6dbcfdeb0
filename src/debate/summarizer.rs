//! The Context Summarizer (C2): compresses an agent's view of history under
//! a length policy. Length-based truncation is the only required method.

use async_trait::async_trait;
use chrono::Utc;

use crate::debate::error::SummarizationError;
use crate::debate::model::{DebateSummaryMetadata, Provider, SummarizationConfig};
use crate::debate::provider::{CompletionRequest, ProviderPort};

pub struct SummarizeRequest<'a> {
    pub content: String,
    pub role: crate::debate::model::Role,
    pub cfg: &'a SummarizationConfig,
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub provider: Provider,
}

pub struct SummarizeOutcome {
    pub summary: String,
    pub metadata: DebateSummaryMetadata,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        req: SummarizeRequest<'_>,
    ) -> Result<SummarizeOutcome, SummarizationError>;
}

/// The only required summarization method: ask the provider for a summary,
/// then truncate it to `cfg.max_length` characters from the left.
pub struct LengthBasedSummarizer<P: ProviderPort> {
    provider: std::sync::Arc<P>,
}

impl<P: ProviderPort> LengthBasedSummarizer<P> {
    pub fn new(provider: std::sync::Arc<P>) -> Self {
        LengthBasedSummarizer { provider }
    }
}

#[async_trait]
impl<P: ProviderPort> Summarizer for LengthBasedSummarizer<P> {
    async fn summarize(
        &self,
        req: SummarizeRequest<'_>,
    ) -> Result<SummarizeOutcome, SummarizationError> {
        let before_chars = req.content.len();
        let completion = self
            .provider
            .complete(CompletionRequest {
                model: req.model.clone(),
                temperature: req.temperature,
                system_prompt: req.system_prompt,
                user_prompt: req.user_prompt,
                messages: None,
                max_tokens: None,
                stop_sequences: Vec::new(),
                tools: Vec::new(),
            })
            .await
            .map_err(|e| SummarizationError(e.to_string()))?;

        let truncated = truncate_chars(&completion.text, req.cfg.max_length);
        let after_chars = truncated.len();
        Ok(SummarizeOutcome {
            summary: truncated,
            metadata: DebateSummaryMetadata {
                before_chars,
                after_chars,
                method: "length-based".into(),
                timestamp: Utc::now(),
                model: Some(req.model),
                temperature: Some(req.temperature),
                provider: Some(req.provider),
                tokens_used: completion.usage.and_then(|u| u.total_tokens),
                latency_ms: None,
            },
        })
    }
}

/// Truncates `s` to at most `max_len` characters (not bytes), preserving
/// UTF-8 boundaries.
pub fn truncate_chars(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

#[cfg(test)]
pub struct MockSummarizer {
    pub fixed_summary: String,
    pub should_fail: bool,
}

#[cfg(test)]
#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        req: SummarizeRequest<'_>,
    ) -> Result<SummarizeOutcome, SummarizationError> {
        if self.should_fail {
            return Err(SummarizationError("mock failure".into()));
        }
        let before_chars = req.content.len();
        let truncated = truncate_chars(&self.fixed_summary, req.cfg.max_length);
        let after_chars = truncated.len();
        Ok(SummarizeOutcome {
            summary: truncated,
            metadata: DebateSummaryMetadata {
                before_chars,
                after_chars,
                method: "length-based".into(),
                timestamp: Utc::now(),
                model: Some(req.model),
                temperature: Some(req.temperature),
                provider: Some(req.provider),
                tokens_used: None,
                latency_ms: None,
            },
        })
    }
}
