//! PDF page extraction.
//!
//! Turns uploaded PDF files into one [`PageFragment`] per page, in file
//! order and then physical page order.

use crate::progress::ProgressReporter;
use crate::types::{PageFragment, UploadedFile};
use lopdf::Document;
use reviewer_core::{AppError, AppResult};

/// Extract every page of every file.
///
/// A file that cannot be parsed fails the whole call; nothing is returned
/// for the files that did parse.
pub fn extract(files: &[UploadedFile]) -> AppResult<Vec<PageFragment>> {
    extract_with_progress(files, &ProgressReporter::noop())
}

/// Same as [`extract`], emitting one "extract" event per file.
pub fn extract_with_progress(
    files: &[UploadedFile],
    progress: &ProgressReporter,
) -> AppResult<Vec<PageFragment>> {
    let total = files.len() as u64;
    let mut fragments = Vec::new();

    for (i, file) in files.iter().enumerate() {
        progress.extract(i as u64 + 1, Some(total), &file.name);
        fragments.extend(extract_file(file)?);
    }

    tracing::info!(
        "Extracted {} pages from {} files",
        fragments.len(),
        files.len()
    );

    Ok(fragments)
}

/// Extract the pages of a single file.
pub fn extract_file(file: &UploadedFile) -> AppResult<Vec<PageFragment>> {
    let document = Document::load_mem(&file.bytes).map_err(|e| {
        AppError::Extraction(format!("Failed to parse PDF '{}': {}", file.name, e))
    })?;

    // BTreeMap keyed by 1-based page number, so iteration is physical order
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(AppError::Extraction(format!(
            "PDF '{}' has no pages",
            file.name
        )));
    }

    let mut fragments = Vec::with_capacity(pages.len());
    for (index, page_number) in pages.keys().enumerate() {
        let text = match document.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                // Text extraction is best effort; a page without decodable
                // text still gets a label
                tracing::warn!(
                    "No text extracted from '{}' page {}: {}",
                    file.name,
                    page_number,
                    e
                );
                String::new()
            }
        };

        fragments.push(PageFragment::new(
            text,
            PageFragment::label_for(&file.name, index),
        ));
    }

    tracing::debug!("Extracted {} pages from '{}'", fragments.len(), file.name);

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::pdf_with_pages;

    #[test]
    fn test_extract_labels_pages_in_order() {
        let files = vec![
            UploadedFile::new("a.pdf", pdf_with_pages(&["Alpha intro", "Alpha details"])),
            UploadedFile::new("b.pdf", pdf_with_pages(&["Beta summary"])),
        ];

        let fragments = extract(&files).unwrap();
        let labels: Vec<&str> = fragments.iter().map(|f| f.source_label.as_str()).collect();

        assert_eq!(labels, vec!["a.pdf_page_0", "a.pdf_page_1", "b.pdf_page_0"]);
        assert!(fragments[0].text.contains("Alpha intro"));
        assert!(fragments[1].text.contains("Alpha details"));
        assert!(fragments[2].text.contains("Beta summary"));
    }

    #[test]
    fn test_extract_invalid_pdf_fails_whole_call() {
        let files = vec![
            UploadedFile::new("good.pdf", pdf_with_pages(&["fine"])),
            UploadedFile::new("broken.pdf", b"not a pdf at all".to_vec()),
        ];

        match extract(&files) {
            Err(AppError::Extraction(msg)) => assert!(msg.contains("broken.pdf")),
            other => panic!("Expected extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_no_files() {
        assert!(extract(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_extract_reports_progress() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let reporter = ProgressReporter::new(Arc::new(move |event| {
            seen_clone.lock().unwrap().push(event.message);
        }));

        let files = vec![UploadedFile::new("a.pdf", pdf_with_pages(&["x"]))];
        extract_with_progress(&files, &reporter).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["reading a.pdf".to_string()]);
    }
}
