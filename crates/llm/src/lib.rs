pub mod models;
pub mod provider;
pub mod providers;

pub use models::{LlmSummarizer, LlmTranslator, Summarizer, Translator};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
