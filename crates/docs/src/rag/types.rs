//! Answer types.

use serde::{Deserialize, Serialize};

/// Response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text produced by the language model
    pub text: String,

    /// Cited source labels, always drawn from the fragments that were
    /// retrieved for this question
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }

    /// Sources joined for display, e.g. `a.pdf_page_0, b.pdf_page_1`.
    pub fn sources_line(&self) -> String {
        self.sources.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_line() {
        let answer = Answer::new(
            "Yes.",
            vec!["a.pdf_page_0".to_string(), "b.pdf_page_1".to_string()],
        );
        assert_eq!(answer.sources_line(), "a.pdf_page_0, b.pdf_page_1");
        assert_eq!(Answer::new("No.", Vec::new()).sources_line(), "");
    }

    #[test]
    fn test_serialization() {
        let answer = Answer::new("Yes.", vec!["a.pdf_page_0".to_string()]);
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["text"], "Yes.");
        assert_eq!(json["sources"][0], "a.pdf_page_0");
    }
}
