//! Top-k retrieval of stored fragments for a question.

use crate::embeddings::EmbeddingProvider;
use crate::types::ScoredFragment;
use crate::vector_index::VectorIndex;
use reviewer_core::AppResult;

/// Number of fragments retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 2;

/// Embed `query` and return the `k` most similar fragments, best first.
pub async fn retrieve(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    k: usize,
) -> AppResult<Vec<ScoredFragment>> {
    if k == 0 || index.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed(query).await?;
    let results = index.search(&query_embedding, k)?;

    tracing::debug!(
        "Retrieved {} fragments (top score: {:?})",
        results.len(),
        results.first().map(|r| r.score)
    );

    Ok(results)
}

/// Retrieval settings held by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retriever {
    k: usize,
}

impl Retriever {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        embedder: &dyn EmbeddingProvider,
        query: &str,
    ) -> AppResult<Vec<ScoredFragment>> {
        retrieve(index, embedder, query, self.k).await
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::index::MemoryIndex;
    use crate::indexer::{build_index, IndexOptions};
    use crate::progress::ProgressReporter;
    use crate::types::PageFragment;

    async fn index_of(embedder: &MockProvider) -> MemoryIndex {
        let fragments = vec![
            PageFragment::new("The warranty covers parts and labour for two years.", "a.pdf_page_0"),
            PageFragment::new("Shipping takes five business days.", "a.pdf_page_1"),
            PageFragment::new("Returns require the original receipt.", "b.pdf_page_0"),
        ];
        build_index(&fragments, embedder, &IndexOptions::default(), &ProgressReporter::noop())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_best_match_first() {
        let embedder = MockProvider::new(256);
        let index = index_of(&embedder).await;

        let results = retrieve(&index, &embedder, "How long is the warranty?", 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fragment.source_label, "a.pdf_page_0");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_never_exceeds_k() {
        let embedder = MockProvider::new(256);
        let index = index_of(&embedder).await;
        let labels: Vec<String> = index.fragments().map(|f| f.source_label.clone()).collect();

        for k in 0..5 {
            let results = retrieve(&index, &embedder, "receipt", k).await.unwrap();
            assert!(results.len() <= k);
            assert!(results
                .iter()
                .all(|r| labels.contains(&r.fragment.source_label)));
        }
    }

    #[tokio::test]
    async fn test_retriever_default_k() {
        let embedder = MockProvider::new(256);
        let index = index_of(&embedder).await;

        let retriever = Retriever::default();
        assert_eq!(retriever.k(), 2);
        let results = retriever.retrieve(&index, &embedder, "shipping").await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
