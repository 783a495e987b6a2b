//! Busy indicator shown on stderr while documents are processed or answered.

use indicatif::{ProgressBar, ProgressStyle};
use reviewer_docs::ProgressReporter;
use std::sync::Arc;
use std::time::Duration;

/// Spinner that clears itself when dropped, on success and error paths alike.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str, no_color: bool) -> Self {
        let template = if no_color {
            "{spinner} {msg}"
        } else {
            "{spinner:.cyan} {msg}"
        };
        let style = ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/", "-"])
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A reporter that shows pipeline progress in the spinner message.
    pub fn reporter(&self) -> ProgressReporter {
        let bar = self.bar.clone();
        ProgressReporter::new(Arc::new(move |event| {
            bar.set_message(event.format_simple());
        }))
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
