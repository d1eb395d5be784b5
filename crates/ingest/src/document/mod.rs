//! PDF text extraction with OCR fallback.
//!
//! [`Extractor`] decides per document whether embedded text is good enough or
//! whether pages must be rasterized and run through OCR. Encrypted and
//! corrupted containers end the request before OCR is ever attempted.

mod engine;
mod native;
pub mod ocr;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

use std::path::PathBuf;

use pdfsum_core::{DocumentCondition, ExtractionMethod};
use thiserror::Error;

pub use engine::{ExtractionOptions, Extractor};
pub use ocr::{OcrEngine, OcrError, PdftoppmRasterizer, Rasterizer, TesseractEngine};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("not a PDF file: {0}")]
    NotPdf(PathBuf),
    #[error("PDF is encrypted and requires a password: {0}")]
    Encrypted(PathBuf),
    #[error("PDF uses an unsupported encryption scheme ({scheme}): {path}")]
    UnsupportedEncryption { path: PathBuf, scheme: String },
    #[error("PDF is corrupted or malformed: {path} ({reason})")]
    Corrupted { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Document condition implied by this error, if it is a condition signal.
    pub fn condition(&self) -> Option<DocumentCondition> {
        match self {
            ExtractionError::Encrypted(_) | ExtractionError::UnsupportedEncryption { .. } => {
                Some(DocumentCondition::Encrypted)
            }
            ExtractionError::Corrupted { .. } => Some(DocumentCondition::Corrupted),
            _ => None,
        }
    }
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    /// The extracted text content.
    pub text: String,
}

/// Bookkeeping for an OCR pass.
#[derive(Debug, Clone, Default)]
pub struct OcrReport {
    pub engine_available: bool,
    pub rendered_pages: usize,
    /// Pages where recognition succeeded but returned only whitespace.
    pub empty_pages: usize,
    /// Pages where recognition failed and were omitted.
    pub failed_pages: usize,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    /// Pages that contributed text, in document order.
    pub pages: Vec<PageContent>,
    pub method: ExtractionMethod,
    /// Page count reported by the PDF container.
    pub page_count: usize,
    /// The container was encrypted and opened with an empty password.
    pub decrypted_with_empty_password: bool,
    /// Trimmed length of the native candidate text.
    pub native_chars: usize,
    /// Present when the OCR fallback ran.
    pub ocr: Option<OcrReport>,
}

impl ExtractedDocument {
    /// Get all text concatenated, one newline between pages.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    /// True when no page produced anything but whitespace.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    pub fn condition(&self) -> DocumentCondition {
        if self.is_empty() {
            DocumentCondition::Empty
        } else {
            DocumentCondition::Readable
        }
    }
}
