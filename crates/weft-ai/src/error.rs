//! Error types for weft-ai

/// Result type for weft-ai operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from AI backends
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API key in the environment
    #[error(
        "Anthropic API key not found\n\
         Set it with: export WEFT_ANTHROPIC_API_KEY=your-key-here"
    )]
    MissingApiKey,

    /// Connection could not be established or was interrupted
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP 429
    #[error("Rate limited by the AI provider")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("Invalid response from AI provider: {message}")]
    InvalidResponse { message: String },

    /// Backend exists but is not implemented yet
    #[error("{backend} backend is not implemented yet")]
    NotImplemented { backend: String },

    /// Unknown backend name
    #[error("Unknown AI backend '{name}'. Supported: claude, anthropic, local")]
    UnknownBackend { name: String },
}

impl Error {
    /// Whether the request may succeed if repeated.
    ///
    /// Rate limits, timeouts, connection failures and 5xx responses are
    /// transient; other 4xx responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Timeout | Self::Network { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse {
                message: e.to_string(),
            }
        } else {
            Self::Network {
                message: e.to_string(),
            }
        }
    }
}
