use async_trait::async_trait;

/// Error types for reply source operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstrateError {
    #[error("Reply source not configured: {0}")]
    NotConfigured(String),

    #[error("Reply source unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Reply script exhausted")]
    ScriptExhausted,
}

/// Port trait for the model-invocation collaborator
///
/// Implementations turn a rendered prompt into the model's raw reply text.
/// A reply that is empty after trimming must be reported as `Ok(None)`; the
/// caller records that as a failed attempt rather than parsing it.
///
/// # Implementations
///
/// - **OpenAiCompatSource**: chat-completions HTTP endpoint
/// - **ScriptedSource**: fixed replay queue for tests and offline runs
///
/// Implementations must be `Send + Sync`; the orchestrator races the call
/// against a cancellation token.
#[async_trait]
pub trait ReplySource: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Request one reply for the given prompt.
    async fn request_reply(&self, prompt: &str) -> Result<Option<String>, SubstrateError>;
}

/// Normalize a raw reply: blank replies become `None`.
pub fn non_blank(reply: Option<String>) -> Option<String> {
    reply.filter(|text| !text.trim().is_empty())
}
