use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub language: LanguageConfig,
    pub chunking: ChunkingConfig,
    pub summary: SummaryConfig,
    pub models: ModelConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PDFSUM_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PDFSUM_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            extraction: ExtractionConfig::from_env_profiled(p),
            language: LanguageConfig::from_env_profiled(p),
            chunking: ChunkingConfig::from_env_profiled(p),
            summary: SummaryConfig::from_env_profiled(p),
            models: ModelConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{} (upload limit {} MB)", self.server.host, self.server.port, self.server.max_upload_mb);
        tracing::info!(
            "  extraction:  min_native_chars={}, ocr_dpi={}, ocr_language={}, allow_empty_password={}",
            self.extraction.min_native_chars,
            self.extraction.ocr_dpi,
            self.extraction.ocr_language,
            self.extraction.allow_empty_password,
        );
        tracing::info!("  language:    target={}", self.language.target);
        tracing::info!(
            "  chunking:    translation={} chars, summary={} chars",
            self.chunking.translation_chunk_chars,
            self.chunking.summary_chunk_chars,
        );
        tracing::info!("  summary:     min={}, max={}", self.summary.min_length, self.summary.max_length);
        tracing::info!(
            "  models:      provider={}, translation={}, summary={}, timeout={}s, concurrency={}",
            self.models.provider,
            self.models.translation_model,
            self.models.summary_model,
            self.models.chunk_timeout_secs,
            self.models.concurrency,
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            server: ServerConfig::default(),
            extraction: ExtractionConfig::default(),
            language: LanguageConfig::default(),
            chunking: ChunkingConfig::default(),
            summary: SummaryConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_mb: usize,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3002),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            max_upload_mb: profiled_env_usize(p, "MAX_UPLOAD_MB", 50),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            cors_origin: "*".to_string(),
            max_upload_mb: 50,
        }
    }
}

// ── Extraction / OCR ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Trimmed native text shorter than this is treated as a scanned document.
    pub min_native_chars: usize,
    /// Raster resolution for OCR page rendering.
    pub ocr_dpi: u32,
    /// Language pack passed to tesseract (`-l`).
    pub ocr_language: String,
    pub tesseract_cmd: String,
    /// Directory holding `pdftoppm`; `None` means resolve from PATH.
    pub poppler_path: Option<PathBuf>,
    /// Accept documents that decrypt with an empty password.
    pub allow_empty_password: bool,
}

impl ExtractionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            min_native_chars: profiled_env_usize(p, "MIN_NATIVE_CHARS", 50),
            ocr_dpi: profiled_env_u32(p, "OCR_DPI", 300),
            ocr_language: profiled_env_or(p, "OCR_LANGUAGE", "eng"),
            tesseract_cmd: profiled_env_or(p, "TESSERACT_CMD", "tesseract"),
            poppler_path: profiled_env_opt(p, "POPPLER_PATH").map(PathBuf::from),
            allow_empty_password: profiled_env_bool(p, "ALLOW_EMPTY_PASSWORD", true),
        }
    }

    /// Full path of the `pdftoppm` executable.
    pub fn pdftoppm_cmd(&self) -> PathBuf {
        match &self.poppler_path {
            Some(dir) => dir.join("pdftoppm"),
            None => PathBuf::from("pdftoppm"),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_native_chars: 50,
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            poppler_path: None,
            allow_empty_password: true,
        }
    }
}

// ── Language ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// ISO 639-3 code of the summary language.
    pub target: String,
}

impl LanguageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            target: profiled_env_or(p, "TARGET_LANGUAGE", "eng").to_lowercase(),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self { target: "eng".to_string() }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub translation_chunk_chars: usize,
    pub summary_chunk_chars: usize,
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            translation_chunk_chars: profiled_env_usize(p, "TRANSLATION_CHUNK_CHARS", 1000),
            summary_chunk_chars: profiled_env_usize(p, "SUMMARY_CHUNK_CHARS", 3000),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            translation_chunk_chars: 1000,
            summary_chunk_chars: 3000,
        }
    }
}

// ── Summary ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl SummaryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            min_length: profiled_env_usize(p, "SUMMARY_MIN_LENGTH", 50),
            max_length: profiled_env_usize(p, "SUMMARY_MAX_LENGTH", 200),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 200,
        }
    }
}

// ── Models ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// "ollama" or "openai"
    pub provider: String,
    pub ollama_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub translation_model: String,
    pub summary_model: String,
    pub translation_enabled: bool,
    pub chunk_timeout_secs: u64,
    /// Concurrent calls allowed per model.
    pub concurrency: usize,
}

impl ModelConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "MODEL_PROVIDER", "ollama"),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_or(p, "OPENAI_BASE_URL", "https://api.openai.com"),
            translation_model: profiled_env_or(p, "TRANSLATION_MODEL", "llama3.2"),
            summary_model: profiled_env_or(p, "SUMMARY_MODEL", "llama3.2"),
            translation_enabled: profiled_env_bool(p, "TRANSLATION_ENABLED", true),
            chunk_timeout_secs: profiled_env_u32(p, "CHUNK_TIMEOUT_SECS", 120) as u64,
            concurrency: profiled_env_usize(p, "MODEL_CONCURRENCY", 1).max(1),
        }
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            translation_model: "llama3.2".to_string(),
            summary_model: "llama3.2".to_string(),
            translation_enabled: true,
            chunk_timeout_secs: 120,
            concurrency: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.extraction.min_native_chars, 50);
        assert_eq!(config.extraction.ocr_dpi, 300);
        assert_eq!(config.chunking.translation_chunk_chars, 1000);
        assert_eq!(config.chunking.summary_chunk_chars, 3000);
        assert_eq!(config.summary.min_length, 50);
        assert_eq!(config.summary.max_length, 200);
        assert_eq!(config.language.target, "eng");
        assert!(config.extraction.allow_empty_password);
    }

    #[test]
    fn pdftoppm_resolves_inside_poppler_dir() {
        let mut extraction = ExtractionConfig::default();
        assert_eq!(extraction.pdftoppm_cmd(), PathBuf::from("pdftoppm"));

        extraction.poppler_path = Some(PathBuf::from("/opt/poppler/bin"));
        assert_eq!(extraction.pdftoppm_cmd(), PathBuf::from("/opt/poppler/bin/pdftoppm"));
    }

    #[test]
    fn profiled_lookup_prefers_prefixed_key() {
        env::set_var("PDFSUM_CFGTEST_OCR_DPI", "150");
        assert_eq!(profiled_env_u32("PDFSUM_CFGTEST", "OCR_DPI", 300), 150);
        assert_eq!(profiled_env_u32("PDFSUM_CFGTEST", "MISSING_KEY_FOR_TEST", 300), 300);
        env::remove_var("PDFSUM_CFGTEST_OCR_DPI");
    }
}
