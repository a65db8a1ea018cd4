//! Translation through the hosted LLM

use async_trait::async_trait;
use std::sync::Arc;

use super::TranslationProvider;
use crate::core::errors::TranslationError;
use crate::core::llm::LlmClient;
use crate::core::models::Language;
use crate::core::prompt::translation_prompt;
use crate::processors::chunker::DEFAULT_CHUNK_CHARS;

/// Asks the LLM for a bare translation of each chunk
#[derive(Clone)]
pub struct LlmTranslationProvider {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
    max_chunk_chars: usize,
}

impl LlmTranslationProvider {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self {
            llm,
            max_tokens,
            max_chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }
}

impl std::fmt::Debug for LlmTranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTranslationProvider")
            .field("max_tokens", &self.max_tokens)
            .field("max_chunk_chars", &self.max_chunk_chars)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TranslationProvider for LlmTranslationProvider {
    fn name(&self) -> &str {
        "llm"
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    async fn translate_chunk(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        let prompt = translation_prompt(text, source, target);
        let translated = self.llm.complete(&prompt, self.max_tokens).await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(translated.to_string())
    }
}
