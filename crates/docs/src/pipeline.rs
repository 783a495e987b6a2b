//! The answer pipeline built by one "process" action.

use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::extract::extract_with_progress;
use crate::index::MemoryIndex;
use crate::indexer::{build_index, IndexOptions};
use crate::progress::ProgressReporter;
use crate::rag::{Answer, AnswerOptions, Answerer};
use crate::retriever::Retriever;
use crate::types::{ScoredFragment, UploadedFile};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use reviewer_core::{AppConfig, AppResult};
use reviewer_llm::{create_client, LlmClient};
use reviewer_prompt::{resolve_prompt, PromptDefinition, QA_WITH_SOURCES};
use std::sync::Arc;
use uuid::Uuid;

/// External collaborators shared by every pipeline of a session.
#[derive(Clone)]
pub struct PipelineServices {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
    pub prompt: PromptDefinition,
}

impl PipelineServices {
    /// Create the configured embedding provider, LLM client and prompt.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedding = EmbeddingConfig::from_app_config(config);
        let embedder = create_provider(
            &embedding,
            config.resolve_api_key(&embedding.provider).as_deref(),
        )?;

        let llm = create_client(
            &config.provider,
            config.provider_endpoint(&config.provider),
            config.resolve_api_key(&config.provider).as_deref(),
            config
                .get_provider_config(&config.provider)
                .and_then(|p| p.timeout()),
        )?;

        let prompt = resolve_prompt(&config.workspace, QA_WITH_SOURCES)?;

        tracing::debug!(
            llm = llm.provider_name(),
            embedder = embedder.provider_name(),
            embedding_model = embedder.model_name(),
            prompt = %prompt.id,
            "Pipeline services ready"
        );

        Ok(Self {
            embedder,
            llm,
            prompt,
        })
    }
}

/// Limits and tuning for building and querying pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Files accepted per processing action
    pub max_files: usize,

    /// Fragments retrieved per question
    pub top_k: usize,

    pub index: IndexOptions,

    pub answer: AnswerOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_files: 3,
            top_k: crate::retriever::DEFAULT_TOP_K,
            index: IndexOptions::default(),
            answer: AnswerOptions::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let pipeline = &config.pipeline;
        Self {
            max_files: pipeline.max_files,
            top_k: pipeline.top_k,
            index: IndexOptions {
                batch_size: EmbeddingConfig::from_app_config(config).batch_size,
                chunk_size: pipeline.chunking.as_ref().map(|c| c.target_size),
            },
            answer: AnswerOptions {
                model: config.model.clone(),
                max_context_chars: pipeline.max_context_chars,
                temperature: pipeline.temperature,
                max_tokens: pipeline.max_tokens,
            },
        }
    }
}

/// Index, retriever and answerer for one batch of files.
pub struct AnswerPipeline {
    batch_id: Uuid,
    built_at: DateTime<Utc>,
    files: Vec<String>,
    labels: Vec<String>,
    index: MemoryIndex,
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Answerer,
}

impl AnswerPipeline {
    /// Extract, embed and index `files`.
    ///
    /// Either a complete pipeline is returned or an error; nothing partial.
    pub async fn build(
        files: &[UploadedFile],
        services: &PipelineServices,
        settings: &PipelineSettings,
        progress: &ProgressReporter,
    ) -> AppResult<Self> {
        let batch_id = Uuid::new_v4();
        tracing::info!(%batch_id, files = files.len(), "Building answer pipeline");

        let fragments = extract_with_progress(files, progress)?;
        let labels: Vec<String> = fragments.iter().map(|f| f.source_label.clone()).collect();

        let index = build_index(
            &fragments,
            services.embedder.as_ref(),
            &settings.index,
            progress,
        )
        .await?;

        Ok(Self {
            batch_id,
            built_at: Utc::now(),
            files: files.iter().map(|f| f.name.clone()).collect(),
            labels,
            index,
            retriever: Retriever::new(settings.top_k),
            embedder: Arc::clone(&services.embedder),
            answerer: Answerer::new(
                Arc::clone(&services.llm),
                services.prompt.clone(),
                settings.answer.clone(),
            ),
        })
    }

    /// Retrieve the top-k fragments for `question`.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<ScoredFragment>> {
        self.retriever
            .retrieve(&self.index, self.embedder.as_ref(), question)
            .await
    }

    /// Retrieve and answer.
    pub async fn ask(&self, question: &str) -> AppResult<Answer> {
        let fragments = self.retrieve(question).await?;
        self.answerer.answer(question, &fragments).await
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Names of the files this pipeline was built from.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Labels of every extracted page, in file and page order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of fragments in the index.
    pub fn fragment_count(&self) -> usize {
        self.index.len()
    }

    pub fn top_k(&self) -> usize {
        self.retriever.k()
    }
}

impl std::fmt::Debug for AnswerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerPipeline")
            .field("batch_id", &self.batch_id)
            .field("built_at", &self.built_at)
            .field("files", &self.files)
            .field("fragments", &self.index.len())
            .field("top_k", &self.retriever.k())
            .finish()
    }
}
