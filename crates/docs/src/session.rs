//! Session controller: staged files, the current pipeline and questions.
//!
//! A session moves through `Empty -> FilesStaged -> Indexed -> Answering ->
//! Indexed`. Processing replaces the pipeline as a whole, and only once the
//! new one is complete.

use crate::pipeline::{AnswerPipeline, PipelineServices, PipelineSettings};
use crate::progress::ProgressReporter;
use crate::rag::Answer;
use crate::types::UploadedFile;
use chrono::{DateTime, Utc};
use reviewer_core::{AppConfig, AppError, AppResult};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// A session shared between tasks; actions run one at a time.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    FilesStaged,
    Indexed,
    Answering,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::FilesStaged => "files staged",
            SessionState::Indexed => "indexed",
            SessionState::Answering => "answering",
        };
        f.write_str(name)
    }
}

/// User-facing message produced by staging files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(m) | Notice::Success(m) | Notice::Warning(m) => m,
        }
    }
}

/// Result of staging a selection of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    /// Names of the files that will be processed
    pub kept: Vec<String>,

    /// Names beyond the per-action limit, in selection order
    pub dropped: Vec<String>,

    pub notice: Notice,
}

/// What a successful process action built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub files: Vec<String>,
    pub labels: Vec<String>,
    pub fragments: usize,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// No files were staged; nothing was built
    NothingToProcess,

    Indexed(BatchSummary),
}

/// One user's working session.
pub struct Session {
    services: PipelineServices,
    settings: PipelineSettings,
    staged: Vec<UploadedFile>,
    /// Staged files have not been indexed yet
    pending: bool,
    pipeline: Option<AnswerPipeline>,
    answering: bool,
    progress: ProgressReporter,
}

impl Session {
    pub fn new(services: PipelineServices, settings: PipelineSettings) -> Self {
        Self {
            services,
            settings,
            staged: Vec::new(),
            pending: false,
            pipeline: None,
            answering: false,
            progress: ProgressReporter::noop(),
        }
    }

    /// Build a session from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let services = PipelineServices::from_config(config)?;
        Ok(Self::new(services, PipelineSettings::from_config(config)))
    }

    /// Report extraction and embedding progress through `progress`.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.set_progress(progress);
        self
    }

    pub fn set_progress(&mut self, progress: ProgressReporter) {
        self.progress = progress;
    }

    /// Wrap the session for use from several tasks.
    pub fn shared(self) -> SharedSession {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        if self.answering {
            SessionState::Answering
        } else if self.pending && !self.staged.is_empty() {
            SessionState::FilesStaged
        } else if self.pipeline.is_some() {
            SessionState::Indexed
        } else {
            SessionState::Empty
        }
    }

    /// The pipeline installed by the last successful process action.
    pub fn pipeline(&self) -> Option<&AnswerPipeline> {
        self.pipeline.as_ref()
    }

    pub fn staged_names(&self) -> Vec<&str> {
        self.staged.iter().map(|f| f.name.as_str()).collect()
    }

    /// Replace the staged selection, keeping at most `max_files` files.
    ///
    /// The current pipeline stays answerable until the next process action.
    pub fn stage_files(&mut self, files: Vec<UploadedFile>) -> StageOutcome {
        let mut kept = files;
        let dropped: Vec<String> = if kept.len() > self.settings.max_files {
            kept.split_off(self.settings.max_files)
                .into_iter()
                .map(|f| f.name)
                .collect()
        } else {
            Vec::new()
        };
        self.stage(kept, dropped)
    }

    /// Like [`Session::stage_files`], but reads only the files that are kept.
    ///
    /// Paths beyond `max_files` are reported by name and never opened.
    pub fn stage_paths(&mut self, paths: &[PathBuf]) -> AppResult<StageOutcome> {
        let cut = paths.len().min(self.settings.max_files);
        let kept = paths[..cut]
            .iter()
            .map(|path| UploadedFile::from_path(path))
            .collect::<AppResult<Vec<_>>>()?;
        let dropped = paths[cut..]
            .iter()
            .map(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
            .collect();
        Ok(self.stage(kept, dropped))
    }

    fn stage(&mut self, mut kept: Vec<UploadedFile>, dropped: Vec<String>) -> StageOutcome {
        let max_files = self.settings.max_files;
        disambiguate_names(&mut kept);

        let notice = if kept.is_empty() {
            Notice::Info("Please upload PDF documents".to_string())
        } else if !dropped.is_empty() {
            tracing::warn!(
                max_files,
                dropped = ?dropped,
                "Too many files selected, ignoring the rest"
            );
            Notice::Warning(format!(
                "More than {} files selected. Only the first {} will be processed; ignored: {}",
                max_files,
                max_files,
                dropped.join(", ")
            ))
        } else {
            Notice::Success(format!("{} document(s) ready for processing", kept.len()))
        };

        self.pending = !kept.is_empty();
        self.staged = kept;

        StageOutcome {
            kept: self.staged.iter().map(|f| f.name.clone()).collect(),
            dropped,
            notice,
        }
    }

    /// Extract and index the staged files, then install the new pipeline.
    ///
    /// On failure the previous pipeline, if any, is left in place.
    pub async fn process(&mut self) -> AppResult<ProcessOutcome> {
        if self.staged.is_empty() {
            tracing::info!("Process requested with no staged files");
            return Ok(ProcessOutcome::NothingToProcess);
        }

        let pipeline =
            AnswerPipeline::build(&self.staged, &self.services, &self.settings, &self.progress)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Processing failed, keeping previous pipeline");
                    e
                })?;

        let summary = BatchSummary {
            batch_id: pipeline.batch_id(),
            files: pipeline.files().to_vec(),
            labels: pipeline.labels().to_vec(),
            fragments: pipeline.fragment_count(),
            built_at: pipeline.built_at(),
        };

        tracing::info!(
            batch_id = %summary.batch_id,
            files = summary.files.len(),
            fragments = summary.fragments,
            "Installed new answer pipeline"
        );

        self.pipeline = Some(pipeline);
        self.pending = false;

        Ok(ProcessOutcome::Indexed(summary))
    }

    /// Answer `question` from the current pipeline.
    pub async fn ask(&mut self, question: &str) -> AppResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Input("Question must not be empty".to_string()));
        }

        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            AppError::Session(
                "No documents have been processed yet. Stage files and process them first"
                    .to_string(),
            )
        })?;

        let _answering = AnsweringFlag::raise(&mut self.answering);
        pipeline.ask(question).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("staged", &self.staged_names())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Rename later files that share a name with an earlier one, so that source
/// labels stay unique: `report.pdf`, `report (2).pdf`, `report (3).pdf`.
fn disambiguate_names(files: &mut [UploadedFile]) {
    let mut used: HashSet<String> = HashSet::new();
    for file in files.iter_mut() {
        if used.insert(file.name.clone()) {
            continue;
        }

        let (stem, ext) = match file.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
            _ => (file.name.clone(), String::new()),
        };
        let renamed = (2..)
            .map(|n| format!("{} ({}){}", stem, n, ext))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or_default();

        tracing::info!(original = %file.name, renamed = %renamed, "Renamed duplicate file name");
        used.insert(renamed.clone());
        file.name = renamed;
    }
}

/// Clears the answering flag when the question completes or fails.
struct AnsweringFlag<'a>(&'a mut bool);

impl<'a> AnsweringFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for AnsweringFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{mock_services, pdf_with_pages};

    fn session(reply: &str) -> Session {
        let (services, _llm) = mock_services(reply);
        Session::new(services, PipelineSettings::default())
    }

    fn pdf(name: &str, pages: &[&str]) -> UploadedFile {
        UploadedFile::new(name, pdf_with_pages(pages))
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = session("unused");
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.pipeline().is_none());
    }

    #[test]
    fn test_stage_files_success_notice() {
        let mut session = session("unused");
        let outcome = session.stage_files(vec![pdf("a.pdf", &["x"]), pdf("b.pdf", &["y"])]);

        assert_eq!(outcome.kept, vec!["a.pdf", "b.pdf"]);
        assert!(outcome.dropped.is_empty());
        assert_eq!(
            outcome.notice,
            Notice::Success("2 document(s) ready for processing".to_string())
        );
        assert_eq!(session.state(), SessionState::FilesStaged);
    }

    #[test]
    fn test_stage_no_files_is_info() {
        let mut session = session("unused");
        let outcome = session.stage_files(Vec::new());

        assert!(matches!(outcome.notice, Notice::Info(_)));
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_duplicate_names_are_renamed() {
        let mut session = session("unused");
        let outcome = session.stage_files(vec![
            pdf("report.pdf", &["q1"]),
            pdf("report.pdf", &["q2"]),
            pdf("report (2).pdf", &["q3"]),
        ]);

        assert_eq!(
            outcome.kept,
            vec!["report.pdf", "report (2).pdf", "report (2) (2).pdf"]
        );
        assert_eq!(session.staged_names(), outcome.kept);
    }

    #[test]
    fn test_disambiguate_names_without_extension() {
        let mut files = vec![
            UploadedFile::new("notes", Vec::new()),
            UploadedFile::new("notes", Vec::new()),
            UploadedFile::new(".pdf", Vec::new()),
            UploadedFile::new(".pdf", Vec::new()),
        ];
        disambiguate_names(&mut files);

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["notes", "notes (2)", ".pdf", ".pdf (2)"]);
    }

    #[test]
    fn test_stage_paths_reads_only_kept_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let path = temp.path().join(name);
            std::fs::write(&path, pdf_with_pages(&[name])).unwrap();
            paths.push(path);
        }
        // Never created; reading it would fail
        paths.push(temp.path().join("missing.pdf"));

        let mut session = session("unused");
        let outcome = session.stage_paths(&paths).unwrap();

        assert_eq!(outcome.kept, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(outcome.dropped, vec!["missing.pdf"]);
        assert!(matches!(outcome.notice, Notice::Warning(ref m) if m.contains("missing.pdf")));
        assert_eq!(session.state(), SessionState::FilesStaged);
    }

    #[test]
    fn test_stage_paths_unreadable_kept_file_is_input_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut session = session("unused");
        let result = session.stage_paths(&[temp.path().join("gone.pdf")]);

        assert!(matches!(result, Err(AppError::Input(_))));
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::FilesStaged.to_string(), "files staged");
        assert_eq!(SessionState::Indexed.to_string(), "indexed");
    }

    #[tokio::test]
    async fn test_process_then_ask_returns_to_indexed() {
        let mut session = session("FINAL ANSWER: Net 30.\nSOURCES: a.pdf_page_0");
        session.stage_files(vec![pdf("a.pdf", &["Payment terms are net 30."])]);

        let outcome = session.process().await.unwrap();
        match outcome {
            ProcessOutcome::Indexed(summary) => {
                assert_eq!(summary.files, vec!["a.pdf"]);
                assert_eq!(summary.labels, vec!["a.pdf_page_0"]);
                assert_eq!(summary.fragments, 1);
            }
            other => panic!("Expected Indexed, got {:?}", other),
        }
        assert_eq!(session.state(), SessionState::Indexed);

        let answer = session.ask("  What are the payment terms? ").await.unwrap();
        assert_eq!(answer.text, "Net 30.");
        assert_eq!(session.state(), SessionState::Indexed);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let mut session = session("unused");
        session.stage_files(vec![pdf("a.pdf", &["text"])]);
        session.process().await.unwrap();

        let result = session.ask("   ").await;
        assert!(matches!(result, Err(AppError::Input(_))));
        assert_eq!(session.state(), SessionState::Indexed);
    }

    #[tokio::test]
    async fn test_ask_before_process_is_session_error() {
        let mut session = session("unused");
        let result = session.ask("Anything?").await;
        assert!(matches!(result, Err(AppError::Session(_))));
    }

    #[tokio::test]
    async fn test_shared_session() {
        let shared = session("FINAL ANSWER: ok").shared();
        {
            let mut guard = shared.lock().await;
            guard.stage_files(vec![pdf("a.pdf", &["text"])]);
            guard.process().await.unwrap();
        }
        assert_eq!(shared.lock().await.state(), SessionState::Indexed);
    }
}
