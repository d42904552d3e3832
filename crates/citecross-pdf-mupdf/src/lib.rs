use std::path::Path;

use mupdf::{Document, TextPageFlags};

use citecross_core::text_utils::expand_ligatures;
use citecross_core::{BackendError, PdfBackend};

/// Text extraction through MuPDF's structured text pages.
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that parsing,
/// matching and reporting can be built and tested without it.
///
/// Text is emitted line by line, one `\n` per line, pages concatenated in
/// order. Lattes CV exports end every page with a "Página gerada pelo Sistema
/// Currículo Lattes" footer; [`with_footer_exclusion`](Self::with_footer_exclusion)
/// drops that band when it gets in the way of the citation-name block.
pub struct MupdfBackend {
    /// Bottom share of each page (0.0–1.0) whose text blocks are dropped.
    /// `None` (the default) keeps the whole page.
    footer_exclusion_ratio: Option<f32>,
    expand_ligatures: bool,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: None,
            expand_ligatures: true,
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop blocks starting in the bottom `ratio` of each page; `0.0` turns it off.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Keep typographic ligatures as extracted instead of expanding them.
    pub fn keep_ligatures(mut self) -> Self {
        self.expand_ligatures = false;
        self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        if !path.is_file() {
            return Err(BackendError::OpenError(format!(
                "no such file: {}",
                path.display()
            )));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        // Dropped at the end of this call on every path, releasing the file.
        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let footer_threshold = match self.footer_exclusion_ratio {
                Some(ratio) => {
                    let bounds = page
                        .bounds()
                        .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
                    Some(bounds.y1 - (bounds.y1 - bounds.y0) * ratio)
                }
                None => None,
            };

            for block in text_page.blocks() {
                if let Some(threshold) = footer_threshold {
                    if block.bounds().y0 >= threshold {
                        continue;
                    }
                }
                for line in block.lines() {
                    text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    text.push('\n');
                }
            }
        }

        if self.expand_ligatures {
            Ok(expand_ligatures(&text))
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_open_error() {
        let backend = MupdfBackend::new();
        let err = backend
            .extract_text(Path::new("/nonexistent/curriculo.pdf"))
            .unwrap_err();
        assert!(matches!(err, BackendError::OpenError(_)));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let backend = MupdfBackend::new();
        assert!(backend.extract_text(&path).is_err());
        // Same outcome on a second attempt.
        assert!(backend.extract_text(&path).is_err());
    }

    #[test]
    fn zero_ratio_disables_footer_exclusion() {
        let backend = MupdfBackend::new().with_footer_exclusion(0.0);
        assert!(backend.footer_exclusion_ratio.is_none());
        let backend = MupdfBackend::new().with_footer_exclusion(0.05);
        assert_eq!(backend.footer_exclusion_ratio, Some(0.05));
        assert!(!MupdfBackend::new().keep_ligatures().expand_ligatures);
    }
}
