//! Resolving command-line paths to PDF files.

use reviewer_core::{AppError, AppResult};
use reviewer_docs::UploadedFile;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand `paths` into a list of files.
///
/// Files are kept as given, in order. Directories contribute their `*.pdf`
/// files (case-insensitive extension), sorted by file name.
pub fn expand_paths(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let before = files.len();
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_pdf(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            tracing::debug!("Found {} PDF files in {:?}", files.len() - before, path);
        } else {
            return Err(AppError::Input(format!("No such file or directory: {:?}", path)));
        }
    }

    Ok(files)
}

/// Read every file named by `paths` into memory.
pub fn load_files(paths: &[PathBuf]) -> AppResult<Vec<UploadedFile>> {
    expand_paths(paths)?
        .iter()
        .map(|path| UploadedFile::from_path(path))
        .collect()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
