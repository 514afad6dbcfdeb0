//! Error taxonomy for the debate engine.
//!
//! Most errors are fatal to a `Run`, but judge JSON parsing and
//! summarization failures are locally recovered and never surface here.

use thiserror::Error;

/// Errors that can escape a `Run` or a State Store operation.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("no active round for debate {0}")]
    NoActiveRound(String),

    #[error("debate not found: {0}")]
    NotFound(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("round {round} timed out after {elapsed_ms}ms")]
    TimeoutError { round: u32, elapsed_ms: u64 },

    #[error("run cancelled")]
    Cancelled,
}

pub type DebateResult<T> = Result<T, DebateError>;

/// Errors local to provider calls; carries a retryability hint per the
/// Provider Port contract (transport failures are retryable, schema/auth are
/// not).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication failure: {0}")]
    Auth(String),

    #[error("response schema error: {0}")]
    Schema(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

/// Judge JSON parse failures. Never escalated — the judge falls back to a
/// plain-markdown description on this error.
#[derive(Debug, Error)]
#[error("judge response parse failure: {0}")]
pub struct ParseError(pub String);

/// Summarization failures. Never escalated — callers fall back to full
/// history / full final-round content on this error.
#[derive(Debug, Error)]
#[error("summarization failed: {0}")]
pub struct SummarizationError(pub String);

/// A tool execution error, captured as a tool result payload rather than
/// propagated; the assistant loop continues with this as the tool's output.
#[derive(Debug, Error)]
#[error("tool '{tool}' failed: {message}")]
pub struct ToolError {
    pub tool: String,
    pub message: String,
}
