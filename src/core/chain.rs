//! Ordered translation providers with fallback, chunking and caching

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::core::cache::{cache_key, TranslationCache};
use crate::core::errors::TranslationError;
use crate::core::models::{Language, TranslationRequest, TranslationResult, TranslationStatus};
use crate::processors::chunker::ChunkSplitter;
use crate::providers::TranslationProvider;

/// Default per-chunk deadline
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Tries each provider in order until one translates every chunk
pub struct TranslationProviderChain {
    providers: Vec<Arc<dyn TranslationProvider>>,
    cache: Arc<TranslationCache>,
    call_timeout: Duration,
}

impl std::fmt::Debug for TranslationProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationProviderChain")
            .field("providers", &self.provider_names())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl TranslationProviderChain {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        Self {
            providers,
            cache: Arc::new(TranslationCache::default()),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: Arc<TranslationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Translate a request. Never fails: when every provider fails the
    /// original text comes back marked [`TranslationStatus::Untranslated`].
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.is_passthrough() {
            return TranslationResult::unchanged(request.text.clone());
        }

        let key = cache_key(&request.text, request.source_lang, request.target_lang);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(
                provider = hit.provider.as_deref().unwrap_or_default(),
                "translation served from cache"
            );
            return hit;
        }

        let mut attempted = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            attempted.push(provider.name().to_string());
            let started = Instant::now();

            match self.translate_with_provider(provider.as_ref(), request).await {
                Ok((text, chunks)) => {
                    info!(
                        provider = provider.name(),
                        outcome = "success",
                        chunks,
                        latency_ms = started.elapsed().as_millis() as u64,
                        source = request.source_lang.code(),
                        target = request.target_lang.code(),
                        "translation attempt"
                    );
                    let result = TranslationResult {
                        text,
                        provider: Some(provider.name().to_string()),
                        attempted,
                        status: TranslationStatus::Translated,
                    };
                    self.cache.insert(key, result.clone()).await;
                    return result;
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        outcome = "failure",
                        latency_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "translation attempt"
                    );
                }
            }
        }

        warn!(
            attempted = attempted.len(),
            source = request.source_lang.code(),
            target = request.target_lang.code(),
            "all translation providers failed, passing original text through"
        );
        TranslationResult::untranslated(request.text.clone(), attempted)
    }

    /// Convenience wrapper building the request
    pub async fn translate_text(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> TranslationResult {
        self.translate(&TranslationRequest::new(text, source, target))
            .await
    }

    /// Returns the reassembled text and the number of chunks sent
    async fn translate_with_provider(
        &self,
        provider: &dyn TranslationProvider,
        request: &TranslationRequest,
    ) -> Result<(String, usize), TranslationError> {
        let splitter = ChunkSplitter::new(provider.max_chunk_chars());
        let mut parts = Vec::new();
        let mut sent = 0;

        for chunk in splitter.split(&request.text) {
            let core = chunk.trim();
            if core.is_empty() {
                parts.push(chunk.to_string());
                continue;
            }

            sent += 1;
            let translated = timeout(
                self.call_timeout,
                provider.translate_chunk(core, request.source_lang, request.target_lang),
            )
            .await
            .map_err(|_| TranslationError::TimeoutError)??;

            if translated.trim().is_empty() {
                return Err(TranslationError::EmptyResponse);
            }

            // Providers trim their output; keep the original chunk boundaries.
            let lead = &chunk[..chunk.len() - chunk.trim_start().len()];
            let trail = &chunk[chunk.trim_end().len()..];
            parts.push(format!("{}{}{}", lead, translated.trim(), trail));
        }

        Ok((ChunkSplitter::join(parts), sent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::ScriptedProvider;

    fn chain(providers: Vec<Arc<ScriptedProvider>>) -> TranslationProviderChain {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn TranslationProvider>)
            .collect();
        TranslationProviderChain::new(providers).with_call_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_same_language_makes_no_calls() {
        let first = ScriptedProvider::tagging("first").shared();
        let chain = chain(vec![first.clone()]);

        let result = chain
            .translate_text("Hola mundo", Language::Es, Language::Es)
            .await;

        assert_eq!(result.text, "Hola mundo");
        assert_eq!(result.status, TranslationStatus::Unchanged);
        assert!(result.provider.is_none());
        assert_eq!(first.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_text_makes_no_calls() {
        let first = ScriptedProvider::tagging("first").shared();
        let chain = chain(vec![first.clone()]);

        let result = chain.translate_text("  \n ", Language::En, Language::Es).await;
        assert_eq!(result.status, TranslationStatus::Unchanged);
        assert_eq!(first.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_second_provider() {
        let first = ScriptedProvider::failing("first").shared();
        let second = ScriptedProvider::tagging("second").shared();
        let chain = chain(vec![first.clone(), second.clone()]);

        let result = chain.translate_text("Hello", Language::En, Language::Es).await;

        assert_eq!(result.text, "[es] Hello");
        assert_eq!(result.provider.as_deref(), Some("second"));
        assert_eq!(result.attempted, vec!["first", "second"]);
        assert_eq!(result.status, TranslationStatus::Translated);
        assert!(result.fell_back());
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_failed_returns_original() {
        let chain = chain(vec![
            ScriptedProvider::failing("first").shared(),
            ScriptedProvider::empty("second").shared(),
        ]);

        let result = chain
            .translate_text("Original text", Language::De, Language::En)
            .await;

        assert_eq!(result.text, "Original text");
        assert_eq!(result.status, TranslationStatus::Untranslated);
        assert!(result.provider.is_none());
        assert_eq!(result.attempted, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_chain_returns_original() {
        let chain = TranslationProviderChain::new(Vec::new());
        let result = chain.translate_text("Hello", Language::En, Language::Fr).await;
        assert_eq!(result.status, TranslationStatus::Untranslated);
        assert!(result.attempted.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_provider() {
        let slow = ScriptedProvider::hanging("slow").shared();
        let fast = ScriptedProvider::tagging("fast").shared();
        let chain = chain(vec![slow.clone(), fast]);

        let result = chain.translate_text("Hello", Language::En, Language::Nl).await;

        assert_eq!(result.provider.as_deref(), Some("fast"));
        assert_eq!(result.attempted, vec!["slow", "fast"]);
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_provider_calls() {
        let first = ScriptedProvider::tagging("first").shared();
        let chain = chain(vec![first.clone()]);

        let a = chain.translate_text("Hello", Language::En, Language::Fr).await;
        let b = chain.translate_text("Hello", Language::En, Language::Fr).await;

        assert_eq!(a.text, b.text);
        assert_eq!(first.calls(), 1);

        // Different direction is a different entry
        chain.translate_text("Hello", Language::En, Language::De).await;
        assert_eq!(first.calls(), 2);
    }

    #[tokio::test]
    async fn test_untranslated_results_are_not_cached() {
        let first = ScriptedProvider::failing("first").shared();
        let chain = chain(vec![first.clone()]);

        chain.translate_text("Hello", Language::En, Language::Fr).await;
        chain.translate_text("Hello", Language::En, Language::Fr).await;
        assert_eq!(first.calls(), 2);
    }

    #[tokio::test]
    async fn test_chunks_reassembled_in_order() {
        let small = ScriptedProvider::new("small", |text, _, _| Ok(text.to_uppercase()))
            .with_max_chunk_chars(10)
            .shared();
        let chain = chain(vec![small.clone()]);

        let text = "one two three. four five six.\nseven eight";
        let result = chain.translate_text(text, Language::En, Language::De).await;

        assert_eq!(result.text, text.to_uppercase());
        assert!(small.calls() > 1);
    }

    #[tokio::test]
    async fn test_failure_mid_document_falls_through() {
        let flaky = ScriptedProvider::new("flaky", |text, _, _| {
            if text.contains("boom") {
                Err(TranslationError::TimeoutError)
            } else {
                Ok(text.to_string())
            }
        })
        .with_max_chunk_chars(8)
        .shared();
        let backup = ScriptedProvider::tagging("backup").shared();
        let chain = chain(vec![flaky, backup]);

        let result = chain
            .translate_text("fine text boom here", Language::Fr, Language::En)
            .await;
        assert_eq!(result.provider.as_deref(), Some("backup"));
        assert_eq!(result.text, "[en] fine text boom here");
    }
}
