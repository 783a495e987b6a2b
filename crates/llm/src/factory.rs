//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and secret
//! injection.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use reviewer_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `timeout` - Optional request timeout in seconds
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(provider = provider_type.as_str(), ?endpoint, "Creating LLM client");

    let api_key = match api_key {
        Some(key) if !key.is_empty() => key,
        _ if provider_type.requires_api_key() => {
            return Err(AppError::Config(format!(
                "Provider '{}' requires an API key",
                provider_type.as_str()
            )));
        }
        _ => "",
    };

    match provider_type {
        ProviderType::Ollama => {
            let mut client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url),
                None => OllamaClient::new(),
            };
            if let Some(secs) = timeout {
                client = client.with_timeout(Duration::from_secs(secs))?;
            }
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let mut client = OpenAiClient::new(api_key);
            if let Some(url) = endpoint {
                client = client.with_base_url(url);
            }
            if let Some(secs) = timeout {
                client = client.with_timeout(Duration::from_secs(secs))?;
            }
            Ok(Arc::new(client))
        }
    }
}
