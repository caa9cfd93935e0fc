//! Provider factory — builds the configured text-generation backend.

use std::sync::Arc;
use toolscribe_config::AppConfig;
use toolscribe_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `default_provider`.
///
/// Settings come from the matching `[providers.<name>]` table when present;
/// the top-level key and the well-known base URL fill the gaps.
pub fn build_default_provider(config: &AppConfig) -> Arc<dyn Provider> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();
    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    if name == "azure" {
        let api_version = provider_config.and_then(|p| p.api_version.as_deref());
        Arc::new(OpenAiCompatProvider::azure(&base_url, &api_key, api_version))
    } else {
        Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key))
    }
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "azure" => std::env::var("AZURE_OPENAI_ENDPOINT")
            .unwrap_or_else(|_| "https://localhost.openai.azure.com".into()),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolscribe_config::ProviderConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn builds_default_provider_without_a_table() {
        let provider = build_default_provider(&AppConfig::default());
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn only_the_default_provider_is_built() {
        let mut config = AppConfig {
            default_provider: "azure".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "azure".into(),
            ProviderConfig {
                api_key: Some("key".into()),
                api_url: Some("https://contoso.openai.azure.com".into()),
                default_model: None,
                api_version: Some("2024-06-01".into()),
            },
        );
        config.providers.insert("ollama".into(), ProviderConfig::default());

        assert_eq!(build_default_provider(&config).name(), "azure");
    }
}
