//! In-memory vector index with exact cosine search.

use crate::types::{PageFragment, ScoredFragment};
use crate::vector_index::VectorIndex;
use reviewer_core::{AppError, AppResult};

#[derive(Debug, Clone)]
struct IndexEntry {
    embedding: Vec<f32>,
    fragment: PageFragment,
}

/// Brute-force index held in memory for the lifetime of one pipeline.
///
/// All embeddings must share the dimension of the first one inserted.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    dimensions: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embedding dimension, once the first fragment is stored.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Fragments in insertion order.
    pub fn fragments(&self) -> impl Iterator<Item = &PageFragment> {
        self.entries.iter().map(|e| &e.fragment)
    }
}

impl VectorIndex for MemoryIndex {
    fn insert(&mut self, embedding: Vec<f32>, fragment: PageFragment) -> AppResult<()> {
        if embedding.is_empty() {
            return Err(AppError::Index(format!(
                "Empty embedding for {}",
                fragment.source_label
            )));
        }

        match self.dimensions {
            Some(dims) if dims != embedding.len() => {
                return Err(AppError::Index(format!(
                    "Embedding for {} has {} dimensions, index expects {}",
                    fragment.source_label,
                    embedding.len(),
                    dims
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }

        self.entries.push(IndexEntry {
            embedding,
            fragment,
        });
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>> {
        if let Some(dims) = self.dimensions {
            if query_embedding.len() != dims {
                return Err(AppError::Index(format!(
                    "Query embedding has {} dimensions, index expects {}",
                    query_embedding.len(),
                    dims
                )));
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredFragment {
                fragment: self.entries[i].fragment.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cosine similarity; 0.0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(label: &str) -> PageFragment {
        PageFragment::new(format!("text of {}", label), label)
    }

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.insert(vec![1.0, 0.0, 0.0], fragment("a.pdf_page_0")).unwrap();
        index.insert(vec![0.0, 1.0, 0.0], fragment("a.pdf_page_1")).unwrap();
        index.insert(vec![0.7, 0.7, 0.0], fragment("b.pdf_page_0")).unwrap();
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_score() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1, 0.0], 3).unwrap();

        let labels: Vec<&str> = results
            .iter()
            .map(|r| r.fragment.source_label.as_str())
            .collect();
        assert_eq!(labels, vec!["a.pdf_page_0", "b.pdf_page_0", "a.pdf_page_1"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_respects_top_k() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 1.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 1.0, 0.0], 10).unwrap().len(), 3);
        assert!(index.search(&[1.0, 1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = MemoryIndex::new();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 2).unwrap().is_empty());
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut index = sample_index();
        let result = index.insert(vec![1.0, 0.0], fragment("c.pdf_page_0"));
        assert!(matches!(result, Err(AppError::Index(_))));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 2),
            Err(AppError::Index(_))
        ));
    }

    #[test]
    fn test_fragments_in_insertion_order() {
        let index = sample_index();
        let labels: Vec<&str> = index.fragments().map(|f| f.source_label.as_str()).collect();
        assert_eq!(labels, vec!["a.pdf_page_0", "a.pdf_page_1", "b.pdf_page_0"]);
        assert_eq!(index.dimensions(), Some(3));
    }
}
