//! Document text extraction.
//!
//! Extraction runs once per request, before any rule is evaluated. A
//! failure here aborts the whole request.

mod pdf;

pub use pdf::PdfTextExtractor;

use std::sync::Arc;
use thiserror::Error;

/// Errors from text extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Failed to extract text from PDF: not a PDF document")]
    NotPdf,

    #[error("Failed to extract text from PDF: {0}")]
    Parse(String),

    #[error("Failed to extract text from PDF: parser panicked: {0}")]
    Panicked(String),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Flattened text content of a document.
///
/// Line breaks and spacing are whatever the extractor produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the document yielded no visible text (e.g. a scan).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ExtractedText> for Arc<str> {
    fn from(text: ExtractedText) -> Self {
        Arc::from(text.0)
    }
}

/// Converts a raw document buffer into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError>;
}
