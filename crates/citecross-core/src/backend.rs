use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns one PDF file into its plain text, one `\n` per text line.
///
/// Implementors only turn a file into text; name parsing and citation
/// matching operate on the returned string and never see the PDF itself.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text of a PDF file, all pages in document order.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
