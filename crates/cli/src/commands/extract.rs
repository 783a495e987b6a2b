//! Extract command handler.
//!
//! Dumps the per-page text of PDF files without calling any service.

use crate::commands::files::load_files;
use clap::Args;
use reviewer_core::AppResult;
use std::path::PathBuf;

/// Print the text extracted from each page
#[derive(Args, Debug)]
pub struct ExtractCommand {
    /// PDF files or directories of PDF files
    #[arg(short, long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExtractCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing extract command");

        let files = load_files(&self.files)?;
        let fragments = reviewer_docs::extract(&files)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&fragments)?);
        } else {
            for fragment in &fragments {
                println!("=== {} ===", fragment.source_label);
                println!("{}", fragment.text.trim_end());
                println!();
            }
        }

        tracing::info!(
            "Extracted {} pages from {} files",
            fragments.len(),
            files.len()
        );
        Ok(())
    }
}
