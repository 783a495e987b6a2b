//! Builds a fresh vector index from page fragments.

use crate::embeddings::EmbeddingProvider;
use crate::index::MemoryIndex;
use crate::progress::ProgressReporter;
use crate::splitter::split_fragments;
use crate::types::PageFragment;
use crate::vector_index::VectorIndex;
use reviewer_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Settings for one index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Texts per embedding request
    pub batch_size: usize,

    /// Split pages into pieces of this many characters (off when `None`)
    pub chunk_size: Option<usize>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            chunk_size: None,
        }
    }
}

/// Embed fragments and insert them into a new in-memory index.
///
/// Blank fragments are skipped. Any embedding failure aborts the build and
/// no partial index is returned.
pub async fn build_index(
    fragments: &[PageFragment],
    embedder: &dyn EmbeddingProvider,
    options: &IndexOptions,
    progress: &ProgressReporter,
) -> AppResult<MemoryIndex> {
    let prepared: Vec<PageFragment> = match options.chunk_size {
        Some(size) => split_fragments(fragments, size),
        None => fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .cloned()
            .collect(),
    };

    let skipped = fragments.len().saturating_sub(prepared.len());
    if options.chunk_size.is_none() && skipped > 0 {
        tracing::debug!("Skipped {} pages without text", skipped);
    }

    if prepared.is_empty() {
        return Err(AppError::Extraction(
            "No text could be extracted from the uploaded files".to_string(),
        ));
    }

    let total = prepared.len() as u64;
    let batch_size = options.batch_size.max(1);
    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(prepared.len());

    for batch in prepared.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|f| f.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider '{}' returned {} embeddings for {} texts",
                embedder.provider_name(),
                vectors.len(),
                texts.len()
            )));
        }

        embeddings.extend(vectors);
        progress.embed(embeddings.len() as u64, Some(total), embedder.model_name());
    }

    if let Some(expected) = embedder.dimensions() {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(AppError::Embedding(format!(
                "Provider '{}' returned a {}-dimensional embedding, expected {}",
                embedder.provider_name(),
                bad.len(),
                expected
            )));
        }
    }

    let mut index = MemoryIndex::new();
    for (embedding, fragment) in embeddings.into_iter().zip(prepared) {
        index.insert(embedding, fragment)?;
    }
    progress.index(index.len() as u64, Some(total));

    tracing::info!(
        "Indexed {} fragments with {} ({})",
        index.len(),
        embedder.provider_name(),
        embedder.model_name()
    );

    Ok(index)
}
