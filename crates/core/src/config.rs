//! Configuration management for PDF Reviewer.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.reviewer/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The workspace directory holds `.reviewer/`, which
//! contains the config file and optional prompt overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers that can answer questions.
pub const LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Providers that can embed page text.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Environment variable holding the OpenAI key when no `apiKeyEnv` is configured.
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .reviewer/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider used for answering ("openai", "ollama")
    pub provider: String,

    /// Model identifier for answering
    pub model: String,

    /// Provider used for page embeddings ("openai", "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier (provider default when unset)
    pub embedding_model: Option<String>,

    /// Explicit API key (takes precedence over provider key variables)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Per-provider settings from config.yaml
    pub llm: Option<LlmConfig>,

    /// Retrieval and answering settings
    pub pipeline: PipelineConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Completion model for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model, if one is configured.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenAI {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Custom endpoint, if one is configured.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Request timeout in seconds, if one is configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Settings for the extract / index / retrieve / answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum number of files accepted per processing action
    #[serde(rename = "maxFiles", default = "default_max_files")]
    pub max_files: usize,

    /// Number of fragments retrieved per question
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on the rendered prompt, in characters
    #[serde(rename = "maxContextChars", default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Sampling temperature for answers
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens generated per answer
    #[serde(rename = "maxTokens", default)]
    pub max_tokens: Option<u32>,

    /// Texts sent per embedding request
    #[serde(rename = "embeddingBatchSize", default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Split long pages before embedding (off when absent)
    #[serde(default)]
    pub chunking: Option<ChunkingConfig>,
}

/// Page splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Target size of each piece, in characters
    #[serde(rename = "targetSize")]
    pub target_size: usize,
}

fn default_max_files() -> usize {
    3
}

fn default_top_k() -> usize {
    2
}

fn default_max_context_chars() -> usize {
    12_000
}

fn default_embedding_batch_size() -> usize {
    100
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
            temperature: None,
            max_tokens: None,
            embedding_batch_size: default_embedding_batch_size(),
            chunking: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    pipeline: Option<PipelineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            embedding_provider: "openai".to_string(),
            embedding_model: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `REVIEWER_WORKSPACE`: Override workspace path
    /// - `REVIEWER_CONFIG`: Path to config file
    /// - `REVIEWER_PROVIDER`: LLM provider
    /// - `REVIEWER_MODEL`: Model identifier
    /// - `REVIEWER_EMBEDDING_PROVIDER`: Embedding provider
    /// - `REVIEWER_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    /// - `REVIEWER_LOG_JSON`: Emit logs as JSON lines
    ///
    /// # Example
    /// ```no_run
    /// use reviewer_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// CLI flags for these two settings must be known before the file is
    /// read, so they are taken here rather than in [`AppConfig::with_overrides`].
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("REVIEWER_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("REVIEWER_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.reviewer_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("REVIEWER_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("REVIEWER_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("REVIEWER_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        config.api_key = std::env::var("REVIEWER_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        if let Ok(json) = std::env::var("REVIEWER_LOG_JSON") {
            config.log_json = matches!(json.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(mut self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                self.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }

        if let Some(pipeline) = config_file.pipeline {
            self.pipeline = pipeline;
        }

        if let Some(llm) = config_file.llm {
            self.provider = llm.active_provider.clone();
            self.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                self.model = provider_config.model().to_string();
            }

            if let Some(provider_config) = llm.providers.get(&llm.active_embedding_provider) {
                self.embedding_model = provider_config.embedding_model().map(str::to_string);
            }

            self.llm = Some(llm);
        }

        Ok(self)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables
    /// and the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .reviewer directory.
    pub fn reviewer_dir(&self) -> PathBuf {
        self.workspace.join(".reviewer")
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Custom endpoint for a provider, if configured.
    pub fn provider_endpoint(&self, provider: &str) -> Option<&str> {
        self.get_provider_config(provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit `REVIEWER_API_KEY`, the provider's `apiKeyEnv`
    /// variable, then `OPENAI_API_KEY` for the openai provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.get_provider_config(provider) {
            if let Ok(key) = std::env::var(api_key_env) {
                return Some(key);
            }
        }

        if provider == "openai" {
            return std::env::var(DEFAULT_OPENAI_KEY_ENV).ok();
        }

        None
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        if !LLM_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        for provider in [&self.provider, &self.embedding_provider] {
            if provider == "openai" && self.resolve_api_key(provider).is_none() {
                return Err(AppError::Config(format!(
                    "API key not found for provider '{}'. Set {} or REVIEWER_API_KEY",
                    provider, DEFAULT_OPENAI_KEY_ENV
                )));
            }
        }

        let pipeline = &self.pipeline;
        if pipeline.max_files == 0 {
            return Err(AppError::Config("pipeline.maxFiles must be at least 1".to_string()));
        }
        if pipeline.top_k == 0 {
            return Err(AppError::Config("pipeline.topK must be at least 1".to_string()));
        }
        if pipeline.embedding_batch_size == 0 {
            return Err(AppError::Config(
                "pipeline.embeddingBatchSize must be at least 1".to_string(),
            ));
        }
        if let Some(ref chunking) = pipeline.chunking {
            if chunking.target_size == 0 {
                return Err(AppError::Config(
                    "pipeline.chunking.targetSize must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.pipeline.max_files, 3);
        assert_eq!(config.pipeline.top_k, 2);
        assert!(config.pipeline.chunking.is_none());
        assert_eq!(config.pipeline.embedding_batch_size, 100);
        assert!(!config.verbose);
        assert!(!config.log_json);
    }

    #[test]
    fn test_reviewer_dir() {
        let config = AppConfig::default();
        assert!(config.reviewer_dir().ends_with(".reviewer"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
            true,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
        assert!(overridden.log_json);
    }

    #[test]
    fn test_merge_yaml_str() {
        let yaml = r#"
llm:
  activeProvider: ollama
  activeEmbeddingProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
      embeddingModel: nomic-embed-text
pipeline:
  topK: 4
  maxContextChars: 8000
  embeddingBatchSize: 16
logging:
  level: debug
  color: false
  json: true
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.embedding_model.as_deref(), Some("nomic-embed-text"));
        assert_eq!(config.pipeline.top_k, 4);
        assert_eq!(config.pipeline.max_files, 3);
        assert_eq!(config.pipeline.max_context_chars, 8000);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.pipeline.embedding_batch_size, 16);
        assert!(config.no_color);
        assert!(config.log_json);
        assert_eq!(
            config.provider_endpoint("ollama"),
            Some("http://localhost:11434")
        );
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "pipeline:\n  maxFiles: 5\n  chunking:\n    targetSize: 500\n").unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.pipeline.max_files, 5);
        assert_eq!(
            config.pipeline.chunking,
            Some(ChunkingConfig { target_size: 500 })
        );
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "pipeline: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama_with_mock_embeddings() {
        let config = AppConfig {
            provider: "ollama".to_string(),
            embedding_provider: "mock".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_with_explicit_key() {
        let config = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.resolve_api_key("openai").as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = AppConfig {
            provider: "ollama".to_string(),
            embedding_provider: "mock".to_string(),
            ..AppConfig::default()
        };
        config.pipeline.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_embedding_batch_size() {
        let mut config = AppConfig {
            provider: "ollama".to_string(),
            embedding_provider: "mock".to_string(),
            ..AppConfig::default()
        };
        config.pipeline.embedding_batch_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_openai_provider_without_organization_parses() {
        let yaml = r#"
llm:
  activeProvider: openai
  activeEmbeddingProvider: openai
  providers:
    openai:
      apiKeyEnv: MY_OPENAI_KEY
      model: gpt-4o-mini
      embeddingModel: text-embedding-3-small
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.get_provider_config("openai"),
            Some(ProviderConfig::OpenAI { api_key_env, .. }) if api_key_env == "MY_OPENAI_KEY"
        ));
        assert_eq!(config.embedding_model.as_deref(), Some("text-embedding-3-small"));
    }
}
