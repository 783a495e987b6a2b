//! Question answering over uploaded PDF documents.
//!
//! Pages are extracted with `lopdf`, embedded, held in an in-memory vector
//! index and answered with one language-model completion that cites the
//! pages it used.

pub mod embeddings;
pub mod extract;
pub mod index;
pub mod indexer;
pub mod pipeline;
pub mod progress;
pub mod rag;
pub mod retriever;
pub mod session;
pub mod splitter;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use extract::{extract, extract_file};
pub use index::MemoryIndex;
pub use pipeline::{AnswerPipeline, PipelineServices, PipelineSettings};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use rag::Answer;
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use session::{
    BatchSummary, Notice, ProcessOutcome, Session, SessionState, SharedSession, StageOutcome,
};
pub use types::{PageFragment, ScoredFragment, UploadedFile};
pub use vector_index::VectorIndex;
