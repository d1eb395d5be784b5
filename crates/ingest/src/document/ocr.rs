//! OCR collaborators: page rasterization and text recognition.
//!
//! The production pair shells out to Poppler's `pdftoppm` and to `tesseract`.
//! Both sit behind traits so the extraction engine can be driven by stubs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use pdfsum_core::config::ExtractionConfig;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
    #[error("page rendering failed: {0}")]
    Render(String),
    #[error("text recognition failed: {0}")]
    Recognize(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders PDF pages to raster images.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `pdf` into `out_dir` at `dpi`, returning the image
    /// paths in page order.
    fn render_pages(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError>;
}

/// Recognizes text in a single page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String, OcrError>;

    /// Whether the engine can run at all. Checked once per OCR pass.
    fn is_available(&self) -> bool {
        true
    }
}

// ── pdftoppm ────────────────────────────────────────────────────────────────

const PAGE_PREFIX: &str = "page";

/// Rasterizer backed by Poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    command: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.pdftoppm_cmd())
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn render_pages(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let output = Command::new(&self.command)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::Unavailable(format!(
                    "{} not found (install Poppler or set POPPLER_PATH)",
                    self.command.display()
                )),
                _ => OcrError::Render(format!("failed to start {}: {e}", self.command.display())),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Render(format!("pdftoppm exited with {}: {}", output.status, stderr.trim())));
        }

        collect_page_images(out_dir)
    }
}

/// `pdftoppm` writes `page-1.png`, `page-2.png`, ... zero-padded to the width of
/// the page count, so a lexical sort is page order.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|e| e == "png")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(PAGE_PREFIX))
        })
        .collect();
    images.sort();
    Ok(images)
}

// ── tesseract ───────────────────────────────────────────────────────────────

/// OCR engine backed by the `tesseract` executable.
pub struct TesseractEngine {
    command: String,
    language: String,
    available: OnceLock<bool>,
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            available: OnceLock::new(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.tesseract_cmd.clone(), config.ocr_language.clone())
    }

    fn check_available(&self) -> bool {
        match Command::new(&self.command).arg("--version").output() {
            Ok(output) if output.status.success() => {
                debug!(command = %self.command, "tesseract available");
                true
            }
            Ok(output) => {
                warn!(command = %self.command, status = %output.status, "tesseract --version failed");
                false
            }
            Err(e) => {
                warn!(
                    command = %self.command,
                    error = %e,
                    "tesseract is not installed or not on PATH; set TESSERACT_CMD"
                );
                false
            }
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::Unavailable(format!("{} not found", self.command)),
                _ => OcrError::Recognize(format!("failed to start {}: {e}", self.command)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognize(format!(
                "tesseract exited with {} for {}: {}",
                output.status,
                image.display(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.check_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_images_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt", "other-01.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let images = collect_page_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn missing_tesseract_reports_unavailable() {
        let engine = TesseractEngine::new("pdfsum-no-such-tesseract-binary", "eng");
        assert!(!engine.is_available());
        let err = engine.recognize(Path::new("page-1.png")).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }

    #[test]
    fn missing_pdftoppm_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = PdftoppmRasterizer::new("/nonexistent/poppler/bin/pdftoppm");
        let err = rasterizer
            .render_pages(Path::new("doc.pdf"), 300, dir.path())
            .unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }
}
