//! Completion client with retry and context-limit recovery.

use crate::model::{Backend, CompletionRequest, ModelError, ToolChoice, ToolSpec};
use std::time::Duration;
use store::{Role, Turn};

/// Fixed interval between retries of a recoverable provider error.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Wraps a [`Backend`] with the retry policy of the orchestration loop.
///
/// Rate limits are retried indefinitely with a fixed backoff. A context
/// overflow is recovered by dropping all tool turns and tool-calling
/// assistant turns from the working message list before retrying; this is
/// lossy but keeps the exchange alive. Any other provider error ends the
/// exchange.
pub struct CompletionClient<B> {
    pub(crate) backend: B,
    model: String,
    backoff: Duration,
}

impl<B: Backend> CompletionClient<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            backoff: RETRY_BACKOFF,
        }
    }

    /// Override the retry backoff (tests use zero).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// The model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a completion for `working`, retrying until the provider
    /// answers or fails fatally.
    ///
    /// `working` is the exchange's working copy of the conversation; context
    /// recovery shrinks it in place. The persisted conversation is owned by
    /// the session and is never touched here.
    pub async fn complete(
        &self,
        working: &mut Vec<Turn>,
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
    ) -> Result<Turn, ModelError> {
        loop {
            let request = CompletionRequest {
                model: &self.model,
                messages: working,
                tools,
                tool_choice,
            };

            match self.backend.complete(request).await {
                Ok(turn) => return Ok(turn),
                Err(ModelError::RateLimited) => {
                    tracing::warn!(
                        backoff_secs = self.backoff.as_secs(),
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(ModelError::ContextOverflow) => {
                    let before = working.len();
                    working.retain(|turn| turn.role != Role::Tool && turn.tool_calls.is_none());
                    tracing::warn!(
                        dropped = before - working.len(),
                        "context limit exceeded, dropped tool history and retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}
