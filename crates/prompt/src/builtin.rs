//! Prompt definitions compiled into the binary.

use crate::types::PromptDefinition;
use reviewer_core::{AppError, AppResult};

/// Identifier of the question-answering prompt that cites sources.
pub const QA_WITH_SOURCES: &str = "qa.with_sources";

const QA_WITH_SOURCES_YAML: &str = r#"
id: qa.with_sources
title: Answer a question from document pages and cite them
apiVersion: "1.0"
createdBy: builtin
inputs: [question, summaries]
template: |
  Given the following extracted parts of one or more documents and a question, create a final answer with references ("SOURCES").
  If you don't know the answer, just say that you don't know. Don't try to make up an answer.
  ALWAYS return a "SOURCES" part in your answer, listing the Source values you used separated by commas.

  QUESTION: {{question}}
  =========
  {{summaries}}
  =========
  FINAL ANSWER:
output:
  format: text
  sourcesMarker: "SOURCES:"
"#;

/// Look up a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> Option<AppResult<PromptDefinition>> {
    let yaml = match prompt_id {
        QA_WITH_SOURCES => QA_WITH_SOURCES_YAML,
        _ => return None,
    };

    Some(serde_yaml::from_str(yaml).map_err(|e| {
        AppError::Prompt(format!("Built-in prompt {} is invalid: {}", prompt_id, e))
    }))
}
