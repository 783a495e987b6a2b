//! Ask command handler.
//!
//! Processes the given PDF files and answers a single question.

use crate::commands::files::expand_paths;
use crate::commands::{format_answer, print_notice};
use crate::spinner::Spinner;
use clap::Args;
use reviewer_core::{config::AppConfig, AppError, AppResult};
use reviewer_docs::{Notice, PipelineServices, PipelineSettings, ProcessOutcome, Session};
use std::path::PathBuf;

/// Process PDF files and answer one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// PDF files or directories of PDF files
    #[arg(short, long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Number of pages to retrieve as context
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        if self.question.trim().is_empty() {
            return Err(AppError::Input("Question must not be empty".to_string()));
        }

        config.validate()?;

        let mut settings = PipelineSettings::from_config(config);
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        let mut session = Session::new(PipelineServices::from_config(config)?, settings);

        let staged = session.stage_paths(&expand_paths(&self.files)?)?;
        if let Notice::Warning(_) = staged.notice {
            print_notice(&staged.notice);
        }

        let summary = {
            let spinner = Spinner::new("Processing documents...", config.no_color);
            session.set_progress(spinner.reporter());
            match session.process().await? {
                ProcessOutcome::Indexed(summary) => summary,
                ProcessOutcome::NothingToProcess => {
                    return Err(AppError::Input(
                        "No PDF files found in the given paths".to_string(),
                    ))
                }
            }
        };
        tracing::info!(
            "Indexed {} fragments from {} files",
            summary.fragments,
            summary.files.len()
        );

        let answer = {
            let _spinner = Spinner::new("Thinking...", config.no_color);
            session.ask(&self.question).await?
        };

        if self.json {
            let output = serde_json::json!({
                "answer": answer.text,
                "sources": answer.sources,
                "model": config.model,
                "provider": config.provider,
                "batch": {
                    "id": summary.batch_id,
                    "files": summary.files,
                    "fragments": summary.fragments,
                    "builtAt": summary.built_at,
                },
                "dropped": staged.dropped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", format_answer(&answer));
        }

        Ok(())
    }
}
