//! Extraction decision engine: native text first, OCR when the text layer is
//! too thin, never OCR for encrypted or corrupted containers.

use std::path::Path;
use std::sync::Arc;

use lopdf::Document;
use pdfsum_core::config::ExtractionConfig;
use pdfsum_core::{is_pdf_filename, ExtractionMethod};
use tracing::{info, warn};

use super::native::{self, NativeFailure};
use super::ocr::{OcrEngine, PdftoppmRasterizer, Rasterizer, TesseractEngine};
use super::{ExtractedDocument, ExtractionError, OcrReport, PageContent};

/// Tunables for the native/OCR decision.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Trimmed native text shorter than this falls through to OCR.
    pub min_native_chars: usize,
    pub ocr_dpi: u32,
    pub allow_empty_password: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_native_chars: 50,
            ocr_dpi: 300,
            allow_empty_password: true,
        }
    }
}

impl From<&ExtractionConfig> for ExtractionOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            min_native_chars: config.min_native_chars,
            ocr_dpi: config.ocr_dpi,
            allow_empty_password: config.allow_empty_password,
        }
    }
}

/// Turns a PDF on disk into plain text.
#[derive(Clone)]
pub struct Extractor {
    options: ExtractionOptions,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(
        options: ExtractionOptions,
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            options,
            rasterizer,
            ocr,
        }
    }

    /// Build with the `pdftoppm` + `tesseract` collaborators.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            ExtractionOptions::from(config),
            Arc::new(PdftoppmRasterizer::from_config(config)),
            Arc::new(TesseractEngine::from_config(config)),
        )
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Extract text from the PDF at `path`.
    ///
    /// Returns `Ok` with possibly empty text when the container is readable;
    /// an empty result means neither the text layer nor OCR produced anything.
    pub fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        if !path.is_file() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }
        if !is_pdf_filename(&path.to_string_lossy()) {
            return Err(ExtractionError::NotPdf(path.to_path_buf()));
        }

        info!(path = %path.display(), "attempting native text extraction");
        let doc = native::load(path).map_err(|f| condition_error(f, path))?;
        self.extract_loaded(path, doc)
    }

    fn extract_loaded(
        &self,
        path: &Path,
        doc: Document,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let filename = display_name(path);
        let native = native::read_pages(doc, self.options.allow_empty_password)
            .map_err(|f| condition_error(f, path))?;

        if native.decrypted_with_empty_password {
            warn!(file = %filename, "PDF was encrypted but opened with an empty password");
        }

        let page_count = native.pages.len();
        let candidate = native.candidate();
        let native_chars = candidate.trim().chars().count();

        if native_chars >= self.options.min_native_chars {
            info!(file = %filename, pages = page_count, chars = native_chars, "native extraction succeeded");
            let pages = native
                .pages
                .into_iter()
                .enumerate()
                .filter(|(_, text)| !text.is_empty())
                .map(|(i, text)| PageContent {
                    page_number: i + 1,
                    text,
                })
                .collect();
            return Ok(ExtractedDocument {
                filename,
                pages,
                method: ExtractionMethod::Native,
                page_count,
                decrypted_with_empty_password: native.decrypted_with_empty_password,
                native_chars,
                ocr: None,
            });
        }

        info!(
            file = %filename,
            chars = native_chars,
            threshold = self.options.min_native_chars,
            "native text insufficient, likely scanned; attempting OCR"
        );
        let (pages, report) = self.run_ocr(path);

        if pages.is_empty() {
            warn!(file = %filename, "OCR produced no text");
        } else {
            info!(file = %filename, pages = pages.len(), "OCR extraction succeeded");
        }

        Ok(ExtractedDocument {
            filename,
            pages,
            method: ExtractionMethod::Ocr,
            page_count,
            decrypted_with_empty_password: native.decrypted_with_empty_password,
            native_chars,
            ocr: Some(report),
        })
    }

    /// Rasterize every page into a scoped temp dir and recognize each image.
    /// Failures degrade to fewer (or zero) pages; they never abort.
    fn run_ocr(&self, path: &Path) -> (Vec<PageContent>, OcrReport) {
        let mut report = OcrReport::default();

        if !self.ocr.is_available() {
            warn!("OCR engine unavailable; treating document as having no extractable text");
            return (Vec::new(), report);
        }
        report.engine_available = true;

        let workdir = match tempfile::Builder::new().prefix("pdfsum-ocr-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "failed to create OCR work directory");
                return (Vec::new(), report);
            }
        };

        let images = match self
            .rasterizer
            .render_pages(path, self.options.ocr_dpi, workdir.path())
        {
            Ok(images) => images,
            Err(e) => {
                warn!(error = %e, "page rendering failed");
                return (Vec::new(), report);
            }
        };
        report.rendered_pages = images.len();

        let mut pages = Vec::new();
        for (i, image) in images.iter().enumerate() {
            let page_number = i + 1;
            match self.ocr.recognize(image) {
                Ok(text) if !text.trim().is_empty() => pages.push(PageContent { page_number, text }),
                Ok(_) => {
                    warn!(page = page_number, "no text found on page using OCR");
                    report.empty_pages += 1;
                }
                Err(e) => {
                    warn!(page = page_number, error = %e, "OCR failed for page; omitting it");
                    report.failed_pages += 1;
                }
            }
        }

        (pages, report)
    }
}

fn condition_error(failure: NativeFailure, path: &Path) -> ExtractionError {
    match failure {
        NativeFailure::Encrypted => {
            warn!(path = %path.display(), "PDF is encrypted and requires a password");
            ExtractionError::Encrypted(path.to_path_buf())
        }
        NativeFailure::UnsupportedEncryption(scheme) => ExtractionError::UnsupportedEncryption {
            path: path.to_path_buf(),
            scheme,
        },
        NativeFailure::Corrupted(reason) => {
            warn!(path = %path.display(), reason = %reason, "PDF appears to be corrupted");
            ExtractionError::Corrupted {
                path: path.to_path_buf(),
                reason,
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;
    use crate::document::OcrError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes one placeholder image per page of the real PDF.
    #[derive(Default)]
    struct PageCountRasterizer {
        calls: AtomicUsize,
    }

    impl Rasterizer for PageCountRasterizer {
        fn render_pages(&self, pdf: &Path, _dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let pages = Document::load(pdf)
                .map_err(|e| OcrError::Render(e.to_string()))?
                .get_pages()
                .len();
            (1..=pages)
                .map(|n| {
                    let image = out_dir.join(format!("page-{n}.png"));
                    std::fs::write(&image, b"png")?;
                    Ok(image)
                })
                .collect()
        }
    }

    struct StubOcr {
        calls: AtomicUsize,
        available: bool,
        fail_page: Option<usize>,
    }

    impl StubOcr {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                available: true,
                fail_page: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OcrEngine for StubOcr {
        fn recognize(&self, image: &Path) -> Result<String, OcrError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_page == Some(n) {
                return Err(OcrError::Recognize("simulated".into()));
            }
            let name = image.file_stem().unwrap().to_str().unwrap();
            Ok(format!("recognized {name}"))
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    fn extractor(ocr: Arc<StubOcr>, rasterizer: Arc<PageCountRasterizer>) -> Extractor {
        Extractor::new(ExtractionOptions::default(), rasterizer, ocr)
    }

    const LONG_TEXT: &str = "The quarterly report shows steady growth across all regions this year.";

    #[test]
    fn missing_file_is_not_found() {
        let ocr = Arc::new(StubOcr::new());
        let ex = extractor(ocr.clone(), Arc::default());
        let err = ex.extract(Path::new("/definitely/missing/file.pdf")).unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn non_pdf_name_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let ocr = Arc::new(StubOcr::new());
        let err = extractor(ocr.clone(), Arc::default()).extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::NotPdf(_)));
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn native_text_is_returned_unchanged_without_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(fixtures::text_pdf(&[LONG_TEXT]), dir.path(), "native.pdf");
        let expected = Document::load(&path).unwrap().extract_text(&[1]).unwrap();

        let ocr = Arc::new(StubOcr::new());
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let doc = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap();

        assert_eq!(doc.method, ExtractionMethod::Native);
        assert_eq!(doc.full_text(), expected);
        assert!(doc.full_text().contains("quarterly report"));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert!(doc.ocr.is_none());
    }

    #[test]
    fn scanned_document_runs_ocr_once_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(fixtures::blank_pdf(3), dir.path(), "scan.pdf");

        let ocr = Arc::new(StubOcr::new());
        let doc = extractor(ocr.clone(), Arc::default()).extract(&path).unwrap();

        assert_eq!(doc.method, ExtractionMethod::Ocr);
        assert_eq!(ocr.calls(), 3);
        assert_eq!(doc.page_count, 3);
        assert_eq!(
            doc.full_text(),
            "recognized page-1\nrecognized page-2\nrecognized page-3"
        );
        let report = doc.ocr.unwrap();
        assert!(report.engine_available);
        assert_eq!(report.rendered_pages, 3);
    }

    #[test]
    fn short_native_text_falls_through_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(
            fixtures::text_pdf(&["Certificate of completion"]),
            dir.path(),
            "certificate.pdf",
        );

        let ocr = Arc::new(StubOcr::new());
        let doc = extractor(ocr.clone(), Arc::default()).extract(&path).unwrap();

        assert_eq!(doc.method, ExtractionMethod::Ocr);
        assert_eq!(ocr.calls(), 1);
        assert!(doc.native_chars > 0 && doc.native_chars < 50);
    }

    #[test]
    fn threshold_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(
            fixtures::text_pdf(&["Certificate of completion"]),
            dir.path(),
            "certificate.pdf",
        );

        let ocr = Arc::new(StubOcr::new());
        let options = ExtractionOptions {
            min_native_chars: 10,
            ..ExtractionOptions::default()
        };
        let ex = Extractor::new(options, Arc::new(PageCountRasterizer::default()), ocr.clone());
        let doc = ex.extract(&path).unwrap();

        assert_eq!(doc.method, ExtractionMethod::Native);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn encrypted_document_never_reaches_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixtures::password_protected(fixtures::text_pdf(&["Top secret."]));
        let path = fixtures::save(doc, dir.path(), "locked.pdf");

        let ocr = Arc::new(StubOcr::new());
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let err = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap_err();

        assert!(matches!(err, ExtractionError::Encrypted(_)), "{err}");
        assert_eq!(err.condition(), Some(pdfsum_core::DocumentCondition::Encrypted));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_password_document_is_read_natively() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixtures::empty_password_encrypted(fixtures::text_pdf(&[LONG_TEXT]));
        let path = fixtures::save(doc, dir.path(), "owner-locked.pdf");

        let ocr = Arc::new(StubOcr::new());
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let doc = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap();

        assert_eq!(doc.method, ExtractionMethod::Native);
        assert!(doc.decrypted_with_empty_password);
        assert!(doc.full_text().contains("quarterly report"));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_password_refused_by_policy_is_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixtures::empty_password_encrypted(fixtures::text_pdf(&[LONG_TEXT]));
        let path = fixtures::save(doc, dir.path(), "owner-locked.pdf");

        let ocr = Arc::new(StubOcr::new());
        let options = ExtractionOptions {
            allow_empty_password: false,
            ..ExtractionOptions::default()
        };
        let err = Extractor::new(options, Arc::new(PageCountRasterizer::default()), ocr.clone())
            .extract(&path)
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Encrypted(_)));
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn unsupported_security_handler_never_reaches_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixtures::aes_encrypted(fixtures::text_pdf(&["Top secret."]));
        let path = fixtures::save(doc, dir.path(), "aes.pdf");

        let ocr = Arc::new(StubOcr::new());
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let err = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap_err();

        match &err {
            ExtractionError::UnsupportedEncryption { scheme, .. } => assert_eq!(scheme, "V=4 R=4"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.condition(), Some(pdfsum_core::DocumentCondition::Encrypted));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn corrupted_document_never_reaches_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\nnot really a pdf body").unwrap();

        let ocr = Arc::new(StubOcr::new());
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let err = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap_err();

        assert!(matches!(err, ExtractionError::Corrupted { .. }));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unavailable_engine_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(fixtures::blank_pdf(2), dir.path(), "scan.pdf");

        let ocr = Arc::new(StubOcr {
            available: false,
            ..StubOcr::new()
        });
        let rasterizer = Arc::new(PageCountRasterizer::default());
        let doc = extractor(ocr.clone(), rasterizer.clone()).extract(&path).unwrap();

        assert!(doc.is_empty());
        assert_eq!(doc.condition(), pdfsum_core::DocumentCondition::Empty);
        assert!(!doc.ocr.unwrap().engine_available);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn failed_page_is_omitted_and_rest_continue() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::save(fixtures::blank_pdf(3), dir.path(), "scan.pdf");

        let ocr = Arc::new(StubOcr {
            fail_page: Some(2),
            ..StubOcr::new()
        });
        let doc = extractor(ocr.clone(), Arc::default()).extract(&path).unwrap();

        assert_eq!(ocr.calls(), 3);
        assert_eq!(doc.full_text(), "recognized page-1\nrecognized page-3");
        assert_eq!(doc.pages[1].page_number, 3);
        assert_eq!(doc.ocr.unwrap().failed_pages, 1);
    }
}
