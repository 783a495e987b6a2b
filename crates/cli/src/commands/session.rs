//! Interactive session command.
//!
//! Reads commands and questions with `rustyline`. Every action reports its
//! own errors and the loop carries on; only configuration errors end it.

use crate::commands::files::expand_paths;
use crate::commands::{format_answer, print_notice};
use crate::spinner::Spinner;
use clap::Args;
use reviewer_core::{config::AppConfig, AppError, AppResult};
use reviewer_docs::{ProcessOutcome, Session, SessionState};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  :files <path>...   stage PDF files or directories (replaces the selection)
  :process           extract and index the staged files
  :status            show staged files and the indexed batch
  :help              show this help
  :quit              leave the session
Anything else is asked as a question about the processed documents.";

/// Interactive session: stage files, process them, ask questions
#[derive(Args, Debug)]
pub struct SessionCommand {
    /// PDF files or directories to stage at startup
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,
}

/// One line of input.
#[derive(Debug, PartialEq)]
enum Input {
    Files(Vec<PathBuf>),
    Process,
    Status,
    Help,
    Quit,
    Question(String),
    Unknown(String),
    Blank,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Blank;
        }

        let Some(command) = line.strip_prefix(':') else {
            return Input::Question(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or_default() {
            "files" | "f" => Input::Files(parts.map(PathBuf::from).collect()),
            "process" | "p" => Input::Process,
            "status" | "s" => Input::Status,
            "help" | "h" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            other => Input::Unknown(other.to_string()),
        }
    }
}

impl SessionCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting interactive session");

        config.validate()?;
        let mut session = Session::from_config(config)?;

        eprintln!("PDF Reviewer session. Type :help for commands.");

        if !self.files.is_empty() {
            report(stage(&mut session, &self.files))?;
        }

        let mut editor = DefaultEditor::new()
            .map_err(|e| AppError::Other(format!("Failed to start line editor: {}", e)))?;

        loop {
            let line = match editor.readline("reviewer> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(AppError::Other(format!("Failed to read input: {}", e))),
            };

            let input = Input::parse(&line);
            if input != Input::Blank {
                let _ = editor.add_history_entry(line.trim());
            }

            let result = match input {
                Input::Blank => Ok(()),
                Input::Quit => break,
                Input::Help => {
                    println!("{}", HELP);
                    Ok(())
                }
                Input::Status => {
                    print_status(&session);
                    Ok(())
                }
                Input::Files(paths) => stage(&mut session, &paths),
                Input::Process => process(&mut session, config.no_color).await,
                Input::Question(question) => ask(&mut session, &question, config.no_color).await,
                Input::Unknown(command) => {
                    eprintln!("Unknown command ':{}'. Type :help for commands.", command);
                    Ok(())
                }
            };
            report(result)?;
        }

        tracing::info!("Session ended");
        Ok(())
    }
}

/// Print a recoverable error and continue; stop on anything else.
fn report(result: AppResult<()>) -> AppResult<()> {
    match result {
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Action failed: {}", e);
            eprintln!("Error: {}", e);
            Ok(())
        }
        other => other,
    }
}

fn stage(session: &mut Session, paths: &[PathBuf]) -> AppResult<()> {
    let outcome = session.stage_paths(&expand_paths(paths)?)?;
    print_notice(&outcome.notice);
    Ok(())
}

async fn process(session: &mut Session, no_color: bool) -> AppResult<()> {
    let spinner = Spinner::new("Processing documents...", no_color);
    session.set_progress(spinner.reporter());
    let outcome = session.process().await;
    drop(spinner);

    match outcome? {
        ProcessOutcome::NothingToProcess => {
            eprintln!("[info] Please upload PDF documents first (:files <path>...)");
        }
        ProcessOutcome::Indexed(summary) => {
            eprintln!(
                "[ok] Indexed {} pages from {}",
                summary.fragments,
                summary.files.join(", ")
            );
        }
    }
    Ok(())
}

async fn ask(session: &mut Session, question: &str, no_color: bool) -> AppResult<()> {
    if session.pipeline().is_none() {
        eprintln!("No documents processed yet. Use :files <path>... and then :process.");
        return Ok(());
    }

    let answer = {
        let _spinner = Spinner::new("Thinking...", no_color);
        session.ask(question).await?
    };
    println!("{}\n", format_answer(&answer));
    Ok(())
}

fn print_status(session: &Session) {
    println!("State: {}", session.state());

    let staged = session.staged_names();
    if staged.is_empty() {
        println!("Staged: none");
    } else {
        println!("Staged: {}", staged.join(", "));
    }

    match session.pipeline() {
        Some(pipeline) => println!(
            "Indexed: {} ({} fragments, k={}, built {})",
            pipeline.files().join(", "),
            pipeline.fragment_count(),
            pipeline.top_k(),
            pipeline.built_at().format("%H:%M:%S")
        ),
        None => println!("Indexed: nothing yet"),
    }

    if session.state() == SessionState::FilesStaged && session.pipeline().is_some() {
        println!("Run :process to replace the indexed batch with the staged files.");
    }
}
