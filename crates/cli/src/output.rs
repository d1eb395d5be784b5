//! Saving summaries to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pdfsum_core::summary_filename;

/// Where to save: the user's choice, or `<stem>_summary.txt` next to the
/// working directory when the answer is blank.
pub fn resolve_output(answer: &str, source: &Path) -> PathBuf {
    let answer = answer.trim();
    if answer.is_empty() {
        PathBuf::from(summary_filename(&source.to_string_lossy()))
    } else {
        PathBuf::from(answer)
    }
}

pub fn save_summary(path: &Path, summary: &str) -> Result<()> {
    std::fs::write(path, summary).with_context(|| format!("failed to save summary to '{}'", path.display()))
}
