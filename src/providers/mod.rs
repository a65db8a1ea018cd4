//! Translation backends
//!
//! Every backend implements [`TranslationProvider`]; the provider chain tries
//! them in order and treats any error as a soft failure.

pub mod google;
pub mod llm;
pub mod mymemory;

use async_trait::async_trait;

use crate::core::errors::TranslationError;
use crate::core::models::Language;
use crate::processors::chunker::DEFAULT_CHUNK_CHARS;

pub use google::GoogleTranslateProvider;
pub use llm::LlmTranslationProvider;
pub use mymemory::MyMemoryProvider;

/// A translation backend reached one chunk at a time
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Name used in diagnostics and results
    fn name(&self) -> &str;

    /// Largest chunk, in characters, accepted per call
    fn max_chunk_chars(&self) -> usize {
        DEFAULT_CHUNK_CHARS
    }

    /// Translate one chunk
    async fn translate_chunk(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError>;
}
