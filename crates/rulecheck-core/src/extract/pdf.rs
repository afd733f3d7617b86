//! PDF text extraction via the pdf-extract crate.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::{ExtractedText, ExtractionError, TextExtractor};

const PDF_MAGIC: &[u8] = b"%PDF";

/// How far into the buffer the `%PDF` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Extracts the embedded text layer of digital PDFs.
///
/// Scanned PDFs without a text layer produce blank text, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        if !has_pdf_header(bytes) {
            return Err(ExtractionError::NotPdf);
        }

        // pdf-extract panics on some malformed inputs
        let text = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|payload| ExtractionError::Panicked(panic_message(&*payload)))?
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        tracing::debug!(bytes = bytes.len(), chars = text.len(), "Extracted PDF text");
        Ok(ExtractedText::new(text))
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .any(|candidate| candidate == PDF_MAGIC)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
