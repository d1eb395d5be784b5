use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Health of a PDF container, determined once by the extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCondition {
    Readable,
    /// Encrypted and no usable credential.
    Encrypted,
    /// Malformed container.
    Corrupted,
    /// Parsed fine, but neither native extraction nor OCR produced text.
    Empty,
}

impl fmt::Display for DocumentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentCondition::Readable => "readable",
            DocumentCondition::Encrypted => "encrypted",
            DocumentCondition::Corrupted => "corrupted",
            DocumentCondition::Empty => "empty",
        };
        f.write_str(label)
    }
}

/// How the final document text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Native,
    Ocr,
}

/// Result of language classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum LanguageTag {
    /// ISO 639-3 code, e.g. `eng`, `fra`.
    Known(String),
    /// Input too short or without enough linguistic signal.
    Unknown,
}

impl LanguageTag {
    pub fn known(code: impl Into<String>) -> Self {
        LanguageTag::Known(code.into().to_lowercase())
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            LanguageTag::Known(code) => Some(code.as_str()),
            LanguageTag::Unknown => None,
        }
    }

    /// True only for a known tag equal to `target`.
    pub fn matches(&self, target: &str) -> bool {
        self.code().is_some_and(|c| c.eq_ignore_ascii_case(target))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageTag::Known(code) => f.write_str(code),
            LanguageTag::Unknown => f.write_str("unknown"),
        }
    }
}

/// Whether a file name carries a `.pdf` extension (case-insensitive).
pub fn is_pdf_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Default summary file name for a source document: `<stem>_summary.txt`.
pub fn summary_filename(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{stem}_summary.txt")
}
