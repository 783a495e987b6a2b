//! Vector index abstraction for page fragments.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval.

use crate::types::{PageFragment, ScoredFragment};
use reviewer_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Inserting fragments with their embeddings
/// - Searching for similar vectors (top-k)
/// - Reporting how many fragments they hold
pub trait VectorIndex: Send + Sync {
    /// Insert a fragment with its embedding.
    fn insert(&mut self, embedding: Vec<f32>, fragment: PageFragment) -> AppResult<()>;

    /// Search for the top-k most similar fragments to the query embedding.
    ///
    /// Returns at most `top_k` fragments ordered by descending similarity.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>>;

    /// Number of fragments stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
