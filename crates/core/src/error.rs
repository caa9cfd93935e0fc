//! Error types for the toolscribe domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for toolscribe operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport-level failures reported by a [`crate::Provider`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Message fragments that mark a failure as rate limiting.
///
/// Matched case-insensitively against the rendered error, since not every
/// transport path surfaces a structured status code.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "ratelimit",
    "rate_limit",
    "too many requests",
    "quota",
    "429",
];

impl ProviderError {
    /// Whether this failure is transient rate limiting and worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::ApiError { status_code: 429, .. } => true,
            other => {
                let text = other.to_string().to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| text.contains(m))
            }
        }
    }
}

/// The outcome of a failed content generation, after retry handling.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The backend stopped at the requested ceiling. Resubmitting the same
    /// input with the same budget truncates identically, so this is never retried.
    #[error("Response truncated at the {max_output_tokens}-token output ceiling; split the input or raise the budget")]
    Truncated { max_output_tokens: u32 },

    #[error("Still rate limited after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: ProviderError },

    #[error("Generation failed: {0}")]
    Provider(ProviderError),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Generation cancelled")]
    Cancelled,
}
