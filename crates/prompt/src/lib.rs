//! Prompt system for PDF Reviewer.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A compiled-in question-answering prompt that cites its sources
//! - Workspace overrides under `.reviewer/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{builtin_prompt, QA_WITH_SOURCES};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, PromptDefinition, PromptOutputSpec};
