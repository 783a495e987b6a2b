//! Embedding configuration types.

use reviewer_core::config::{AppConfig, ProviderConfig};
use serde::{Deserialize, Serialize};

/// Embedding configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected embedding dimensions; unchecked when unknown
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Maximum number of texts sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Custom endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_batch_size() -> usize {
    100
}

/// Default model for a provider.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "text-embedding-ada-002",
        "ollama" => "nomic-embed-text",
        _ => "trigram-v1",
    }
}

/// Known output sizes of common embedding models.
pub fn known_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-ada-002" | "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" => Some(1024),
        "all-minilm" | "trigram-v1" => Some(384),
        _ => None,
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("mock")
    }
}

impl EmbeddingConfig {
    /// Defaults for a provider: its default model and that model's size.
    pub fn for_provider(provider: &str) -> Self {
        let model = default_model(provider);
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions: known_dimensions(model),
            batch_size: default_batch_size(),
            endpoint: None,
            timeout_secs: None,
        }
    }

    /// Derive the embedding settings from the application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let provider = config.embedding_provider.as_str();
        let mut embedding = Self::for_provider(provider);
        embedding.batch_size = config.pipeline.embedding_batch_size;

        if let Some(ref model) = config.embedding_model {
            embedding.model = model.clone();
            embedding.dimensions = known_dimensions(model);
        }

        if let Some(provider_config) = config.get_provider_config(provider) {
            embedding.endpoint = match provider_config {
                ProviderConfig::OpenAI { endpoint, .. } => endpoint.clone(),
                ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.clone()),
            };
            embedding.timeout_secs = provider_config.timeout();
        }

        embedding
    }
}
