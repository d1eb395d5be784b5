//! Language classification.

use pdfsum_core::LanguageTag;
use tracing::debug;

/// Inputs shorter than this (after trimming) are never classified.
pub const MIN_CLASSIFIABLE_CHARS: usize = 10;

/// Yields a language tag, or [`LanguageTag::Unknown`] when the text carries too
/// little signal. Never fails.
pub trait LanguageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> LanguageTag;
}

/// Trigram-based detection via `whatlang`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangClassifier;

impl LanguageClassifier for WhatlangClassifier {
    fn classify(&self, text: &str) -> LanguageTag {
        classify(text)
    }
}

/// Classify `text`, returning an ISO 639-3 tag such as `eng` or `fra`.
pub fn classify(text: &str) -> LanguageTag {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_CLASSIFIABLE_CHARS {
        return LanguageTag::Unknown;
    }

    match whatlang::detect(trimmed) {
        Some(info) => {
            debug!(
                lang = info.lang().code(),
                confidence = info.confidence(),
                reliable = info.is_reliable(),
                "language detected"
            );
            LanguageTag::known(info.lang().code())
        }
        None => LanguageTag::Unknown,
    }
}
