use thiserror::Error;

/// Model roles the pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Translation,
    Summarization,
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRole::Translation => f.write_str("translation"),
            ModelRole::Summarization => f.write_str("summarization"),
        }
    }
}

/// Request-level failures. Each message names the stage and the cause and is
/// safe to show to end users.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("extraction: file not found at '{0}'")]
    NotFound(String),

    #[error("extraction: '{0}' is not a PDF file")]
    NotPdf(String),

    #[error("extraction: '{0}' is encrypted and requires a password")]
    Encrypted(String),

    #[error("extraction: '{name}' is encrypted with an unsupported scheme ({scheme})")]
    EncryptionUnsupported { name: String, scheme: String },

    #[error("extraction: '{0}' appears to be corrupted or malformed")]
    Corrupted(String),

    #[error("extraction: no usable text could be extracted from '{0}' (native and OCR both empty)")]
    NoExtractableText(String),

    #[error("summarization: input text is too short to summarize ({len} characters, minimum {min})")]
    SummarizationTooShort { len: usize, min: usize },

    #[error("summarization: {0}")]
    SummarizationFailed(String),

    #[error("{0}: model is not available")]
    ModelUnavailable(ModelRole),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stage() {
        let e = PipelineError::Encrypted("a.pdf".into());
        assert!(e.to_string().starts_with("extraction:"));

        let e = PipelineError::EncryptionUnsupported {
            name: "a.pdf".into(),
            scheme: "V=4 R=4".into(),
        };
        assert_eq!(
            e.to_string(),
            "extraction: 'a.pdf' is encrypted with an unsupported scheme (V=4 R=4)"
        );

        let e = PipelineError::SummarizationTooShort { len: 40, min: 50 };
        assert!(e.to_string().starts_with("summarization:"));
        assert!(e.to_string().contains("40"));

        let e = PipelineError::ModelUnavailable(ModelRole::Summarization);
        assert_eq!(e.to_string(), "summarization: model is not available");
    }
}
