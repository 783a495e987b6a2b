//! Core types for the document pipeline.

use reviewer_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file handed to the pipeline, held entirely in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name, used to build source labels
    pub name: String,

    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk; its name is the final path component.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Input(format!("Not a file path: {:?}", path)))?;

        let bytes = std::fs::read(path)
            .map_err(|e| AppError::Input(format!("Failed to read {:?}: {}", path, e)))?;

        Ok(Self { name, bytes })
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Text of one page together with the label it is cited by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFragment {
    pub text: String,

    /// `<file name>_page_<zero-based index>`
    pub source_label: String,
}

impl PageFragment {
    pub fn new(text: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
        }
    }

    /// Build the label for page `index` (zero-based) of `file_name`.
    pub fn label_for(file_name: &str, index: usize) -> String {
        format!("{}_page_{}", file_name, index)
    }
}

/// A fragment returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: PageFragment,

    /// Cosine similarity to the query (-1.0 to 1.0)
    pub score: f32,
}
