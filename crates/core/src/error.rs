//! Error types for PDF Reviewer.
//!
//! This module defines a unified error enum that covers every failure
//! category of the document pipeline: configuration, input validation,
//! PDF extraction, embedding, indexing, language-model calls and prompts.

use thiserror::Error;

/// Unified error type for PDF Reviewer.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are represented and propagated, never turned into panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid user input (empty question, unsupported file, ...)
    #[error("Input error: {0}")]
    Input(String),

    /// A PDF could not be parsed or produced no text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding service errors (auth, quota, network, bad response)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors
    #[error("Index error: {0}")]
    Index(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The assembled prompt does not fit the configured context budget
    #[error("Context too large: prompt is {size} characters, limit is {limit}")]
    ContextTooLarge { size: usize, limit: usize },

    /// Session state errors (asking before any documents were processed)
    #[error("Session error: {0}")]
    Session(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the session can keep going after this error.
    ///
    /// Everything raised by a single user action is recoverable; only
    /// configuration problems stop the program.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Config(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
