//! Native (embedded text) extraction via lopdf.

use std::path::Path;

use lopdf::encryption::DecryptionError;
use lopdf::Document;
use tracing::{debug, warn};

/// Why the container could not be read natively.
#[derive(Debug)]
pub(crate) enum NativeFailure {
    Encrypted,
    /// Security handler lopdf cannot decrypt (AES, V4/V5), described as `V=.. R=..`.
    UnsupportedEncryption(String),
    Corrupted(String),
}

/// Per-page text from the embedded text layer.
#[derive(Debug)]
pub(crate) struct NativeText {
    /// One entry per page, in page order (empty string when a page has no text).
    pub pages: Vec<String>,
    pub decrypted_with_empty_password: bool,
}

impl NativeText {
    /// Non-empty pages joined with a newline.
    pub fn candidate(&self) -> String {
        self.pages
            .iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Open the PDF container.
pub(crate) fn load(path: &Path) -> Result<Document, NativeFailure> {
    match Document::load(path) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            // lopdf may refuse to open an encrypted file outright; that is
            // still an encryption condition, not corruption.
            if declares_encryption(path) {
                debug!(path = %path.display(), error = %e, "load failed on a file declaring /Encrypt");
                Err(NativeFailure::Encrypted)
            } else {
                Err(NativeFailure::Corrupted(e.to_string()))
            }
        }
    }
}

fn declares_encryption(path: &Path) -> bool {
    std::fs::read(path)
        .map(|bytes| bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt"))
        .unwrap_or(false)
}

/// Resolve encryption, then pull the text layer of every page.
pub(crate) fn read_pages(
    mut doc: Document,
    allow_empty_password: bool,
) -> Result<NativeText, NativeFailure> {
    let mut decrypted_with_empty_password = false;

    if doc.is_encrypted() {
        if !allow_empty_password {
            return Err(NativeFailure::Encrypted);
        }
        let scheme = encryption_scheme(&doc);
        doc.decrypt("").map_err(|e| match e {
            lopdf::Error::Decryption(
                DecryptionError::UnsupportedEncryption | DecryptionError::InvalidKeyLength,
            ) => {
                warn!(scheme = %scheme, "unsupported PDF security handler");
                NativeFailure::UnsupportedEncryption(scheme)
            }
            other => {
                debug!(error = %other, "empty-password decryption failed");
                NativeFailure::Encrypted
            }
        })?;
        decrypted_with_empty_password = true;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for number in page_numbers {
        match doc.extract_text(&[number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!(page = number, error = %e, "native text extraction failed for page");
                pages.push(String::new());
            }
        }
    }

    Ok(NativeText {
        pages,
        decrypted_with_empty_password,
    })
}

fn encryption_scheme(doc: &Document) -> String {
    let entry = |key: &[u8]| {
        doc.get_encrypted()
            .ok()
            .and_then(|dict| dict.get(key).ok())
            .and_then(|v| v.as_i64().ok())
            .map_or_else(|| "?".to_string(), |v| v.to_string())
    };
    format!("V={} R={}", entry(b"V"), entry(b"R"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;

    #[test]
    fn reads_every_page_in_order() {
        let doc = fixtures::text_pdf(&["First page text.", "Second page text."]);
        let native = read_pages(doc, true).unwrap();
        assert_eq!(native.pages.len(), 2);
        assert!(native.pages[0].contains("First page"));
        assert!(native.pages[1].contains("Second page"));
        assert!(!native.decrypted_with_empty_password);
    }

    #[test]
    fn candidate_skips_empty_pages() {
        let native = NativeText {
            pages: vec!["a".into(), String::new(), "b".into()],
            decrypted_with_empty_password: false,
        };
        assert_eq!(native.candidate(), "a\nb");
    }

    #[test]
    fn password_protected_document_is_encrypted() {
        let doc = fixtures::password_protected(fixtures::text_pdf(&["Secret text."]));
        assert!(doc.is_encrypted());
        assert!(matches!(read_pages(doc, true), Err(NativeFailure::Encrypted)));
    }

    #[test]
    fn empty_user_password_is_decrypted() {
        let doc = fixtures::empty_password_encrypted(fixtures::text_pdf(&["Quarterly figures.", "Outlook."]));
        assert!(doc.is_encrypted());

        let native = read_pages(doc, true).unwrap();
        assert!(native.decrypted_with_empty_password);
        assert!(native.pages[0].contains("Quarterly figures."));
        assert!(native.pages[1].contains("Outlook."));
    }

    #[test]
    fn policy_can_refuse_empty_password_attempt() {
        let doc = fixtures::empty_password_encrypted(fixtures::text_pdf(&["Quarterly figures."]));
        assert!(matches!(read_pages(doc, false), Err(NativeFailure::Encrypted)));
    }

    #[test]
    fn aes_handler_is_reported_as_unsupported() {
        let doc = fixtures::aes_encrypted(fixtures::text_pdf(&["Secret text."]));
        match read_pages(doc, true) {
            Err(NativeFailure::UnsupportedEncryption(scheme)) => assert_eq!(scheme, "V=4 R=4"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is definitely not a pdf container").unwrap();
        assert!(matches!(load(&path), Err(NativeFailure::Corrupted(_))));
    }

    #[test]
    fn unreadable_file_declaring_encryption_is_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        std::fs::write(&path, b"%PDF-1.4\ntrailer << /Encrypt 5 0 R >>\n%%EOF").unwrap();
        assert!(matches!(load(&path), Err(NativeFailure::Encrypted)));
    }
}
