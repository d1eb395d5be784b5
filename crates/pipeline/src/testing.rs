//! Counting stubs for the model collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pdfsum_core::LanguageTag;
use pdfsum_ingest::LanguageClassifier;
use pdfsum_llm::{LlmError, Summarizer, Translator};

/// Call numbers are 1-based.
#[derive(Default)]
struct Script {
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    stall_on: HashSet<usize>,
    always_fail: bool,
}

impl Script {
    async fn next(&self) -> Result<usize, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.stall_on.contains(&n) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.always_fail || self.fail_on.contains(&n) {
            return Err(LlmError::ApiError {
                status: 500,
                body: format!("simulated failure on call {n}"),
            });
        }
        Ok(n)
    }
}

pub(crate) struct StubTranslator {
    script: Script,
    prefix: String,
    max_lengths: Mutex<Vec<usize>>,
}

impl StubTranslator {
    pub(crate) fn prefixing(prefix: &str) -> Self {
        Self {
            script: Script::default(),
            prefix: prefix.to_string(),
            max_lengths: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always_failing() -> Self {
        let mut stub = Self::prefixing("");
        stub.script.always_fail = true;
        stub
    }

    pub(crate) fn failing_on(mut self, call: usize) -> Self {
        self.script.fail_on.insert(call);
        self
    }

    pub(crate) fn stalling_on(mut self, call: usize) -> Self {
        self.script.stall_on.insert(call);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_lengths(&self) -> Vec<usize> {
        self.max_lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, chunk: &str, max_length: usize) -> Result<String, LlmError> {
        self.max_lengths.lock().unwrap().push(max_length);
        self.script.next().await?;
        Ok(format!("{}{}", self.prefix, chunk))
    }
}

/// Answers call `n` with `S{n}` and records every input.
#[derive(Default)]
pub(crate) struct StubSummarizer {
    script: Script,
    inputs: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn always_failing() -> Self {
        let mut stub = Self::default();
        stub.script.always_fail = true;
        stub
    }

    pub(crate) fn failing_on(mut self, call: usize) -> Self {
        self.script.fail_on.insert(call);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, chunk: &str, _min_length: usize, _max_length: usize) -> Result<String, LlmError> {
        self.inputs.lock().unwrap().push(chunk.to_string());
        let n = self.script.next().await?;
        Ok(format!("S{n}"))
    }
}

/// Always answers with the same tag.
pub(crate) struct FixedClassifier(pub LanguageTag);

impl LanguageClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> LanguageTag {
        self.0.clone()
    }
}

/// `count` sentences of 99 characters each, separated by single spaces.
pub(crate) fn english_text(count: usize) -> String {
    (0..count)
        .map(|i| {
            let mut s = format!("Paragraph {i:03} describes the findings");
            while s.chars().count() < 98 {
                s.push_str(" a");
            }
            s.truncate(98);
            s.push('.');
            s
        })
        .collect::<Vec<_>>()
        .join(" ")
}
