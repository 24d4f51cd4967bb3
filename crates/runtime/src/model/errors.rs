use thiserror::Error;

/// Errors from LLM provider calls.
///
/// The first two variants are recoverable and handled transparently by the
/// completion client; the rest end the exchange.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The provider rate-limited the request.
    #[error("rate limited by provider")]
    RateLimited,

    /// The conversation no longer fits the model's context window.
    #[error("context length exceeded")]
    ContextOverflow,

    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider returned an error response.
    #[error("provider api ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
