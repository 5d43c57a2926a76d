//! Completion client trait, the boundary to the hosted text-completion service.
//!
//! The session engine only ever needs "send N ordered messages, receive one
//! reply", so the trait is a single call. Failures are typed so callers can
//! tell an expired key from a throttled one or a slow provider.

use crate::BoxFuture;

use super::types::CompletionRequest;

/// Errors from completion calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("authentication failed (check API key): {0}")]
    Auth(String),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout")]
    Timeout,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Core trait for completion backends.
///
/// Implementations must be `Send + Sync` for use across tokio tasks.
/// Uses `BoxFuture` for object safety (allows `Arc<dyn CompletionClient>`).
pub trait CompletionClient: Send + Sync {
    /// Client display name (e.g. "OpenAI-compatible").
    fn name(&self) -> &str;

    /// Perform one completion, returning the reply text.
    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>>;
}
