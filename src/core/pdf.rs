//! Text extraction from PDF documents.
//!
//! The pipeline only depends on [`PdfTextExtractor`]; the default backend
//! wraps the `pdf-extract` crate.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{0}")]
    Backend(String),

    #[error("PDF parser crashed while reading {0}")]
    Panicked(String),
}

/// Turns a PDF file into the text of its pages, in page order.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, PdfError>;

    /// The whole document: each page's text followed by a newline.
    fn extract_text(&self, path: &Path) -> Result<String, PdfError> {
        let pages = self.extract_pages(path)?;
        let mut content = String::new();
        for page in pages {
            content.push_str(&page);
            content.push('\n');
        }
        Ok(content)
    }
}

/// Production backend using `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfTextExtractor for PdfExtractBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, PdfError> {
        // Malformed documents can make the parser panic; keep that inside this item.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path))) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(PdfError::Backend(e.to_string())),
            Err(_) => Err(PdfError::Panicked(path.display().to_string())),
        }
    }
}
