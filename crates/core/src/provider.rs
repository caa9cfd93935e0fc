//! Provider trait — the abstraction over text-generation backends.
//!
//! A Provider takes a system prompt, a user prompt and an output-token
//! ceiling, and returns the generated text together with the reason the
//! backend stopped generating.
//!
//! Implementations: OpenAI-compatible endpoints and Azure OpenAI deployments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model or deployment to use (e.g., "gpt-4o")
    pub model: String,

    /// Instructions for the backend
    pub system_prompt: String,

    /// The content to work on
    pub user_prompt: String,

    /// Hard ceiling on generated tokens
    pub max_output_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.3
}

/// Why the backend stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of output
    Complete,
    /// Output hit the requested token ceiling
    LengthLimited,
    /// Anything else the backend reported (content filter, tool calls, ...)
    Other(String),
}

impl FinishReason {
    /// Map a wire-level finish/stop reason onto our enum.
    ///
    /// Covers the OpenAI (`stop`, `length`) and Anthropic (`end_turn`,
    /// `max_tokens`) vocabularies. A missing reason is treated as complete.
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            None | Some("stop") | Some("end_turn") | Some("stop_sequence") => Self::Complete,
            Some("length") | Some("max_tokens") => Self::LengthLimited,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every text-generation backend implements this trait. The retrying client
/// and the batch stages call `complete()` without knowing which backend is
/// behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "azure").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
