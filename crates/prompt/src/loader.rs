//! Prompt loader for YAML prompt definitions.

use crate::builtin::builtin_prompt;
use crate::types::PromptDefinition;
use reviewer_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Directory, relative to the workspace, that holds prompt overrides.
const PROMPTS_DIR: &str = ".reviewer/prompts";

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// This function reads `<id>.yml` from the `.reviewer/prompts/` directory.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.reviewer/`
/// * `prompt_id` - Prompt identifier (e.g., "qa.with_sources")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve a prompt, preferring a workspace override over the built-in copy.
///
/// A broken override is an error rather than a silent fallback.
pub fn resolve_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).exists() {
        return load_prompt(workspace_path, prompt_id);
    }

    match builtin_prompt(prompt_id) {
        Some(definition) => {
            let definition = definition?;
            validate_prompt(&definition)?;
            tracing::debug!("Using built-in prompt: {}", definition.id);
            Ok(definition)
        }
        None => Err(AppError::Prompt(format!("Unknown prompt: {}", prompt_id))),
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for input in &def.inputs {
        if !references_input(&def.template, input) {
            return Err(AppError::Prompt(format!(
                "Prompt {} declares input '{}' but its template never uses it",
                def.id, input
            )));
        }
    }

    Ok(())
}

/// Whether `input` appears inside a `{{ ... }}` expression of `template`,
/// e.g. `{{question}}`, `{{ question }}` or `{{#each summaries}}`.
fn references_input(template: &str, input: &str) -> bool {
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return false;
        };

        let expression =
            after[..end].trim_matches(|c: char| matches!(c, '{' | '~' | '#' | '/' | '&'));
        if expression.split_whitespace().any(|token| token == input) {
            return true;
        }
        rest = &after[end + 2..];
    }
    false
}
