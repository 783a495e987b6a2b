//! Question answering over retrieved fragments.
//!
//! Uses the "stuff" strategy: every retrieved fragment goes into a single
//! prompt and one completion produces the answer and its citations.

pub mod answer;
pub mod types;

pub use answer::{format_summaries, parse_answer, AnswerOptions, Answerer};
pub use types::Answer;
