//! Prompt types for PDF Reviewer.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Optional system message template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Variables the template expects; rendering fails if one is missing
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Template string with Handlebars syntax
    pub template: String,

    /// Expected output format
    pub output: PromptOutputSpec,
}

/// Expected output format for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    /// Output format (e.g., "text", "markdown")
    pub format: String,

    /// Marker the model is told to put before its cited sources
    #[serde(rename = "sourcesMarker", default, skip_serializing_if = "Option::is_none")]
    pub sources_marker: Option<String>,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,
}

impl BuiltPrompt {
    /// Total rendered size in characters, system message included.
    pub fn char_len(&self) -> usize {
        self.user.chars().count() + self.system.as_deref().map_or(0, |s| s.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: test.prompt
title: Test Prompt
apiVersion: "1.0"
createdBy: test
inputs: [question]
template: "{{question}}"
output:
  format: text
  sourcesMarker: "SOURCES:"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "test.prompt");
        assert_eq!(def.inputs, vec!["question".to_string()]);
        assert!(def.system.is_none());
        assert_eq!(def.output.sources_marker.as_deref(), Some("SOURCES:"));
    }

    #[test]
    fn test_built_prompt_char_len() {
        let built = BuiltPrompt {
            system: Some("ab".to_string()),
            user: "héllo".to_string(),
            source_prompt_id: "test".to_string(),
        };
        assert_eq!(built.char_len(), 7);
    }
}
