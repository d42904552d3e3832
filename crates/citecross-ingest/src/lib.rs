use std::path::{Path, PathBuf};

use thiserror::Error;

use citecross_core::PdfBackend;

pub mod pipeline;

// Re-export domain types for convenience
pub use citecross_core::{CandidateDocument, ComparisonStats, ProgressEvent, SkipReason};
pub use pipeline::{Comparison, ComparisonOutcome};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of citecross-ingest)")]
    NoPdfSupport,
}

/// Text pulled from one file. A failed extraction yields empty text and
/// the failure message; it is never an error for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub failure: Option<String>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Wraps a [`PdfBackend`] so per-file failures become empty text plus a
/// logged diagnostic, letting a batch continue.
pub struct TextExtractor<'a> {
    backend: &'a dyn PdfBackend,
}

impl<'a> TextExtractor<'a> {
    pub fn new(backend: &'a dyn PdfBackend) -> Self {
        Self { backend }
    }

    pub fn extract(&self, path: &Path) -> ExtractedText {
        match self.backend.extract_text(path) {
            Ok(text) => ExtractedText { text, failure: None },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to extract text from PDF");
                ExtractedText {
                    text: String::new(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }
}

/// List the `.pdf` files (extension compared case-insensitively) directly
/// inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::NotADirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_pdf_path(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// The backend used when none is supplied: MuPDF.
#[cfg(feature = "pdf")]
pub fn default_backend() -> Result<Box<dyn PdfBackend>, IngestError> {
    Ok(Box::new(citecross_pdf_mupdf::MupdfBackend::default()))
}

#[cfg(not(feature = "pdf"))]
pub fn default_backend() -> Result<Box<dyn PdfBackend>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf_path(Path::new("a/CV.PDF")));
        assert!(is_pdf_path(Path::new("a/tese.pdf")));
        assert!(!is_pdf_path(Path::new("a/tese.pdf.txt")));
        assert!(!is_pdf_path(Path::new("a/pdf")));
    }

    #[test]
    fn list_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn list_pdfs_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            list_pdfs(&missing),
            Err(IngestError::NotADirectory(_))
        ));
    }
}
