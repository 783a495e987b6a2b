//! Command handlers for the PDF Reviewer CLI.

pub mod ask;
pub mod extract;
pub mod files;
pub mod session;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use extract::ExtractCommand;
pub use session::SessionCommand;

use reviewer_docs::{Answer, Notice};

/// Print a staging notice to stderr.
pub fn print_notice(notice: &Notice) {
    let tag = match notice {
        Notice::Info(_) => "info",
        Notice::Success(_) => "ok",
        Notice::Warning(_) => "warning",
    };
    eprintln!("[{}] {}", tag, notice.message());
}

/// Render an answer for the terminal.
pub fn format_answer(answer: &Answer) -> String {
    if answer.sources.is_empty() {
        answer.text.clone()
    } else {
        format!("{}\n\nSources: {}", answer.text, answer.sources_line())
    }
}
