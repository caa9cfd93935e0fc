//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, Azure OpenAI deployments, OpenRouter, Ollama, vLLM,
//! and any endpoint exposing `/chat/completions`.
//!
//! Only non-streaming chat completions are used: every generation call in
//! the pipeline needs the whole text and its finish reason before it can
//! decide whether the output is usable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toolscribe_core::error::ProviderError;
use toolscribe_core::provider::*;
use tracing::{debug, warn};

/// Default Azure OpenAI `api-version`.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

/// How the endpoint expects to be addressed and authenticated.
#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    /// `{base_url}/chat/completions`, `Authorization: Bearer`
    OpenAi,
    /// `{base_url}/openai/deployments/{model}/chat/completions?api-version=...`, `api-key` header
    Azure { api_version: String },
}

/// An OpenAI-compatible text-generation provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    flavor: Flavor,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            flavor: Flavor::OpenAi,
            client,
        }
    }

    /// Create an Azure OpenAI provider. The request's model is used as the
    /// deployment name.
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: Option<&str>,
    ) -> Self {
        let mut provider = Self::new("azure", endpoint, api_key);
        provider.flavor = Flavor::Azure {
            api_version: api_version.unwrap_or(DEFAULT_AZURE_API_VERSION).to_string(),
        };
        provider
    }

    fn completions_url(&self, model: &str) -> String {
        match &self.flavor {
            Flavor::OpenAi => format!("{}/chat/completions", self.base_url),
            Flavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, model, api_version
            ),
        }
    }

    fn models_url(&self) -> String {
        match &self.flavor {
            Flavor::OpenAi => format!("{}/models", self.base_url),
            Flavor::Azure { api_version } => {
                format!("{}/openai/models?api-version={}", self.base_url, api_version)
            }
        }
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        let messages = [
            ApiMessage {
                role: "system".into(),
                content: Some(request.system_prompt.clone()),
            },
            ApiMessage {
                role: "user".into(),
                content: Some(request.user_prompt.clone()),
            },
        ];

        serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
            "stream": false,
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.flavor {
            Flavor::OpenAi => builder.header("Authorization", format!("Bearer {}", self.api_key)),
            Flavor::Azure { .. } => builder.header("api-key", &self.api_key),
        }
    }

    fn parse_response(api_response: ApiResponse) -> std::result::Result<CompletionResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
            usage,
            model: api_response.model.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl toolscribe_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = self.completions_url(&request.model);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            max_output_tokens = request.max_output_tokens,
            "Sending completion request"
        );

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            let error_body = response.text().await.unwrap_or_default();
            // Azure reports exhausted quota as 403 with a quota message
            if error_body.to_lowercase().contains("quota") {
                return Err(ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                });
            }
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::parse_response(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = self.models_url();
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API wire types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
