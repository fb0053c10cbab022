//! Provider error types.

use thiserror::Error;

/// Errors that can occur when asking a generator for questions.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured.
    #[error("no API key configured for {0}")]
    MissingCredential(String),

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The reply arrived but did not contain a usable question set.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
