//! Prompt assembly, completion and citation parsing.

use crate::rag::types::Answer;
use crate::types::ScoredFragment;
use reviewer_core::{AppError, AppResult};
use reviewer_llm::{LlmClient, LlmRequest};
use reviewer_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Markers that introduce the cited sources in a model reply.
const SOURCE_MARKERS: [&str; 2] = ["sources:", "source:"];

const ANSWER_PREFIX: &str = "final answer:";

/// Settings for answering.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOptions {
    /// Model identifier sent with every completion request
    pub model: String,

    /// Upper bound on the rendered prompt, in characters
    pub max_context_chars: usize,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_context_chars: 12_000,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Answers questions from retrieved fragments with one completion each.
pub struct Answerer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    options: AnswerOptions,
}

impl Answerer {
    pub fn new(client: Arc<dyn LlmClient>, prompt: PromptDefinition, options: AnswerOptions) -> Self {
        Self {
            client,
            prompt,
            options,
        }
    }

    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    /// Render the prompt for `query` over `fragments`.
    ///
    /// Fails with `ContextTooLarge` instead of truncating.
    pub fn render_prompt(&self, query: &str, fragments: &[ScoredFragment]) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), query.to_string());
        variables.insert("summaries".to_string(), format_summaries(fragments));

        let built = build_prompt(&self.prompt, &variables)?;

        let size = built.char_len();
        if size > self.options.max_context_chars {
            return Err(AppError::ContextTooLarge {
                size,
                limit: self.options.max_context_chars,
            });
        }

        Ok(built)
    }

    /// Answer `query` from `fragments` and keep only citations of them.
    #[tracing::instrument(skip(self, query, fragments), fields(fragment_count = fragments.len(), model = %self.options.model))]
    pub async fn answer(&self, query: &str, fragments: &[ScoredFragment]) -> AppResult<Answer> {
        let built = self.render_prompt(query, fragments)?;

        let mut request = LlmRequest::new(built.user, &self.options.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.options.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(&request).await?;
        tracing::debug!(
            provider = self.client.provider_name(),
            total_tokens = response.usage.total_tokens,
            "Completion received"
        );

        let retrieved: Vec<&str> = fragments
            .iter()
            .map(|f| f.fragment.source_label.as_str())
            .collect();
        let marker = self.prompt.output.sources_marker.as_deref();

        Ok(parse_answer(&response.content, &retrieved, marker))
    }
}

/// Render fragments as `Content: ...` / `Source: ...` blocks.
pub fn format_summaries(fragments: &[ScoredFragment]) -> String {
    fragments
        .iter()
        .map(|f| {
            format!(
                "Content: {}\nSource: {}",
                f.fragment.text.trim(),
                f.fragment.source_label
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split a model reply into answer text and cited sources.
///
/// The answer is everything before the first sources marker (matched
/// case-insensitively), minus a leading `FINAL ANSWER:`. Cited labels are
/// kept only if they are in `retrieved`, deduplicated, in citation order.
/// `extra_marker` adds a marker declared by the prompt definition.
pub fn parse_answer(raw: &str, retrieved: &[&str], extra_marker: Option<&str>) -> Answer {
    // ASCII lowercasing keeps byte offsets aligned with `raw`
    let lower = raw.to_ascii_lowercase();
    let extra = extra_marker.map(str::to_ascii_lowercase);

    let split = SOURCE_MARKERS
        .iter()
        .copied()
        .chain(extra.as_deref())
        .filter(|m| !m.is_empty())
        .filter_map(|m| lower.find(m).map(|pos| (pos, m.len())))
        .min_by_key(|(pos, _)| *pos);

    let (answer_part, sources_part) = match split {
        Some((pos, len)) => (&raw[..pos], &raw[pos + len..]),
        None => (raw, ""),
    };

    let mut text = answer_part.trim();
    if text.to_ascii_lowercase().starts_with(ANSWER_PREFIX) {
        text = text[ANSWER_PREFIX.len()..].trim_start();
    }

    let mut sources: Vec<String> = Vec::new();
    for cited in sources_part
        .split(|c: char| c == ',' || c == '\n' || c == ';')
        .map(clean_citation)
        .filter(|c| !c.is_empty())
    {
        if let Some(label) = retrieved.iter().find(|label| **label == cited) {
            if !sources.iter().any(|s| s.as_str() == *label) {
                sources.push(label.to_string());
            }
        } else {
            tracing::debug!("Dropping citation not among retrieved fragments: {}", cited);
        }
    }

    Answer::new(text.trim_end(), sources)
}

fn clean_citation(raw: &str) -> &str {
    raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '[' | ']' | '(' | ')' | '*' | '-' | '.')
    })
}
