//! Question answering pipeline
//!
//! Detect → Truncate → Translate(document) → Query LLM → Translate(answer) →
//! Score. Every stage except the LLM call degrades instead of failing; the
//! degradations recorded on the way determine the answer's confidence.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::core::cache::TranslationCache;
use crate::core::chain::TranslationProviderChain;
use crate::core::confidence;
use crate::core::config::AdvisorConfig;
use crate::core::errors::{AdvisorError, LlmError, Result, TranslationError};
use crate::core::llm::{GeminiClient, LlmClient};
use crate::core::models::{Answer, Degradation, DocumentLanguage, Language, Query};
use crate::core::prompt::{answer_prompt, clip, AnswerContext};
use crate::processors::detector::LanguageDetector;
use crate::processors::domain::visa_context_note;
use crate::processors::excerpts::{rank_excerpts, DEFAULT_TOP_K};
use crate::processors::sanitize::sanitize_question;
use crate::processors::truncator::DocumentTruncator;
use crate::providers::{
    GoogleTranslateProvider, LlmTranslationProvider, MyMemoryProvider, TranslationProvider,
};

/// Language the LLM reads and answers in
pub const WORKING_LANGUAGE: Language = Language::En;

/// Characters of the document handed to the detector
const DETECTION_SAMPLE_CHARS: usize = 5000;

/// Per-request limits
#[derive(Debug, Clone)]
pub struct AnswerSettings {
    pub max_question_chars: usize,
    pub max_document_chars: usize,
    pub max_response_chars: usize,
    pub max_response_tokens: u32,
    pub llm_timeout: Duration,
    pub excerpt_count: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from(&AdvisorConfig::default())
    }
}

impl From<&AdvisorConfig> for AnswerSettings {
    fn from(config: &AdvisorConfig) -> Self {
        Self {
            max_question_chars: config.max_question_chars,
            max_document_chars: config.max_document_chars,
            max_response_chars: config.max_response_chars,
            max_response_tokens: config.max_response_tokens,
            llm_timeout: config.llm_timeout(),
            excerpt_count: DEFAULT_TOP_K,
        }
    }
}

/// Build the default provider chain: cloud translation when a key is
/// configured, then the LLM when given, then MyMemory.
pub fn build_provider_chain(
    config: &AdvisorConfig,
    llm: Option<Arc<dyn LlmClient>>,
) -> std::result::Result<TranslationProviderChain, TranslationError> {
    let mut providers: Vec<Arc<dyn TranslationProvider>> = Vec::new();

    if let Some(key) = config.google_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        providers.push(Arc::new(GoogleTranslateProvider::new(
            config.translation_endpoint.clone(),
            key,
            config.provider_timeout(),
        )?
        .with_max_chunk_chars(config.chunk_chars)));
    }

    if config.enable_llm_translation {
        if let Some(llm) = llm {
            providers.push(Arc::new(
                LlmTranslationProvider::new(llm, config.max_response_tokens)
                    .with_max_chunk_chars(config.chunk_chars),
            ));
        }
    }

    providers.push(Arc::new(MyMemoryProvider::new(
        config.mymemory_endpoint.clone(),
        config.mymemory_email.clone(),
        config.provider_timeout(),
    )?));

    let chain = TranslationProviderChain::new(providers)
        .with_cache(Arc::new(TranslationCache::new(config.cache_capacity)))
        .with_call_timeout(config.provider_timeout());
    info!(providers = ?chain.provider_names(), "translation chain ready");
    Ok(chain)
}

/// Answers questions about legal documents. Holds no per-request state.
pub struct AnswerOrchestrator {
    chain: Arc<TranslationProviderChain>,
    llm: Arc<dyn LlmClient>,
    detector: LanguageDetector,
    truncator: DocumentTruncator,
    settings: AnswerSettings,
}

impl std::fmt::Debug for AnswerOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerOrchestrator")
            .field("chain", &self.chain)
            .field("detector", &self.detector)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AnswerOrchestrator {
    pub fn new(
        chain: Arc<TranslationProviderChain>,
        llm: Arc<dyn LlmClient>,
        detector: LanguageDetector,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            chain,
            llm,
            detector,
            truncator: DocumentTruncator::new(settings.max_document_chars),
            settings,
        }
    }

    /// Wire the Gemini client and default provider chain from configuration
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::new(config)?);
        let chain = build_provider_chain(config, Some(llm.clone()))
            .map_err(|e| AdvisorError::ServiceUnavailable(LlmError::Transport {
                message: e.to_string(),
            }))?;
        let detector =
            LanguageDetector::new(config.detection_min_chars, config.detection_min_confidence);

        Ok(Self::new(
            Arc::new(chain),
            llm,
            detector,
            AnswerSettings::from(config),
        ))
    }

    pub fn chain(&self) -> &Arc<TranslationProviderChain> {
        &self.chain
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Answer one question. Fails only on bad input or when the LLM cannot
    /// produce an answer.
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let started = Instant::now();
        let question = self.validate_question(&query.question)?;
        let mut degradations = Vec::new();

        let document = query
            .document
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| d.replace("\r\n", "\n"));

        let working_document = match &document {
            Some(document) => Some(
                self.prepare_document(document, query.document_lang, &mut degradations)
                    .await,
            ),
            None => None,
        };

        let excerpts = working_document
            .as_deref()
            .map(|d| rank_excerpts(d, &question, self.settings.excerpt_count))
            .unwrap_or_default();

        let prompt = answer_prompt(
            &AnswerContext {
                question: &question,
                document: working_document.as_deref(),
                excerpts: &excerpts,
            },
            WORKING_LANGUAGE,
        );

        let llm_started = Instant::now();
        let reply = timeout(
            self.settings.llm_timeout,
            self.llm.complete(&prompt, self.settings.max_response_tokens),
        )
        .await
        .map_err(|_| LlmError::Timeout)
        .and_then(|r| r)
        .map_err(|e| {
            warn!(error = %e, "LLM call failed");
            AdvisorError::ServiceUnavailable(e)
        })?;
        debug!(
            prompt_chars = prompt.chars().count(),
            reply_chars = reply.chars().count(),
            latency_ms = llm_started.elapsed().as_millis() as u64,
            "LLM answered"
        );

        let mut reply = clip(reply.trim(), self.settings.max_response_chars);
        if let Some(note) = working_document.as_deref().and_then(visa_context_note) {
            reply.push_str("\n\n");
            reply.push_str(&note);
        }

        let translated = self
            .chain
            .translate_text(&reply, WORKING_LANGUAGE, query.preferred_lang)
            .await;
        if translated.fell_back() {
            degradations.push(Degradation::AnswerTranslationFallback);
        }

        let confidence = confidence::score(&degradations);
        info!(
            preferred = query.preferred_lang.code(),
            has_document = document.is_some(),
            ?degradations,
            %confidence,
            latency_ms = started.elapsed().as_millis() as u64,
            "question answered"
        );

        Ok(Answer {
            response: translated.text,
            confidence,
            degradations,
        })
    }

    fn validate_question(&self, raw: &str) -> Result<String> {
        let question = sanitize_question(raw);
        if question.is_empty() {
            return Err(AdvisorError::bad_input("Please enter a question."));
        }
        let len = question.chars().count();
        if len > self.settings.max_question_chars {
            return Err(AdvisorError::bad_input(format!(
                "Question is too long ({} characters, max {}).",
                len, self.settings.max_question_chars
            )));
        }
        Ok(question)
    }

    /// Detect, truncate and translate the document into the working language
    async fn prepare_document(
        &self,
        document: &str,
        declared: DocumentLanguage,
        degradations: &mut Vec<Degradation>,
    ) -> String {
        let source = match declared {
            DocumentLanguage::Known(lang) => lang,
            DocumentLanguage::Auto => {
                let sample: String = document.chars().take(DETECTION_SAMPLE_CHARS).collect();
                let detection = self.detector.detect(&sample);
                debug!(
                    lang = detection.language.code(),
                    confidence = detection.confidence,
                    defaulted = detection.defaulted,
                    "document language detected"
                );
                if detection.defaulted {
                    degradations.push(Degradation::LanguageDefaulted);
                }
                detection.language
            }
        };

        let truncation = self.truncator.truncate(document);
        if truncation.applied {
            info!(
                original_chars = document.chars().count(),
                kept_chars = truncation.text.chars().count(),
                "document truncated"
            );
            degradations.push(Degradation::DocumentTruncated);
        }

        let translated = self
            .chain
            .translate_text(&truncation.text, source, WORKING_LANGUAGE)
            .await;
        if translated.fell_back() {
            degradations.push(Degradation::DocumentTranslationFallback);
        }
        translated.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Confidence;
    use crate::core::testing::{FakeLlm, LogCapture, ScriptedProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn orchestrator(
        providers: Vec<Arc<ScriptedProvider>>,
        llm: Arc<FakeLlm>,
    ) -> AnswerOrchestrator {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn TranslationProvider>)
            .collect();
        let chain = TranslationProviderChain::new(providers)
            .with_call_timeout(Duration::from_millis(200));
        AnswerOrchestrator::new(
            Arc::new(chain),
            llm,
            LanguageDetector::default(),
            AnswerSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_spanish_answer_without_document() {
        let provider = ScriptedProvider::tagging("primary").shared();
        let llm = FakeLlm::replying("You need a residence permit.").shared();
        let advisor = orchestrator(vec![provider.clone()], llm.clone());

        let query = Query::new("What visa do I need?").with_preferred_lang(Language::Es);
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(answer.response, "[es] You need a residence permit.");
        assert_eq!(answer.confidence, Confidence::High);
        assert!(answer.degradations.is_empty());
        assert_eq!(provider.calls(), 1);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_english_answer_needs_no_translation() {
        let provider = ScriptedProvider::tagging("primary").shared();
        let llm = FakeLlm::replying("Yes.").shared();
        let advisor = orchestrator(vec![provider.clone()], llm);

        let answer = advisor.answer(&Query::new("Can I work?")).await.unwrap();
        assert_eq!(answer.response, "Yes.");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_huge_document_truncated_before_translation() {
        let largest_input = Arc::new(AtomicUsize::new(0));
        let seen = largest_input.clone();
        let provider = ScriptedProvider::new("primary", move |text, _, _| {
            seen.fetch_max(text.chars().count(), Ordering::SeqCst);
            Ok(text.to_string())
        })
        .shared();
        let llm = FakeLlm::replying("The contract requires a permit.").shared();
        let advisor = orchestrator(vec![provider.clone()], llm.clone());

        let line = "Der Mieter zahlt die Miete jeden Monat rechtzeitig.\n";
        let document = line.repeat(2 * 1024 * 1024 / line.len());
        let query = Query::new("Do I need a permit?")
            .with_document(document, DocumentLanguage::Known(Language::De));

        let answer = advisor.answer(&query).await.unwrap();

        assert!(answer.confidence <= Confidence::Medium);
        assert!(answer.degradations.contains(&Degradation::DocumentTruncated));
        // The whole truncated document fits in a handful of chunks
        let max_doc = AnswerSettings::default().max_document_chars;
        assert!(provider.calls() <= max_doc / 1000 + 1);
        assert!(largest_input.load(Ordering::SeqCst) <= 2000);
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("[content omitted]"));
        assert!(prompt.chars().count() < max_doc + 2000);
    }

    #[tokio::test]
    async fn test_llm_transport_error_is_service_unavailable() {
        let provider = ScriptedProvider::tagging("primary").shared();
        let llm = FakeLlm::failing(|| LlmError::Transport {
            message: "connection reset".to_string(),
        })
        .shared();
        let advisor = orchestrator(vec![provider], llm);

        let query = Query::new("What visa do I need?").with_preferred_lang(Language::Fr);
        let err = advisor.answer(&query).await.unwrap_err();

        assert_eq!(err.code(), "service-unavailable");
        assert!(!err.user_message().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_defaulted_language_with_fallback_is_low() {
        let first = ScriptedProvider::failing("first").shared();
        let second = ScriptedProvider::tagging("second").shared();
        let llm = FakeLlm::replying("Answer.").shared();
        let advisor = orchestrator(vec![first, second], llm);

        // Too short to classify, so English is assumed
        let query = Query::new("Is this valid?")
            .with_document("Visum ok", DocumentLanguage::Auto)
            .with_preferred_lang(Language::Nl);
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(
            answer.degradations,
            vec![
                Degradation::LanguageDefaulted,
                Degradation::AnswerTranslationFallback
            ]
        );
        assert_eq!(answer.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_truncation_and_fallback_together_rolls_up_to_low() {
        let first = ScriptedProvider::failing("first").shared();
        let second = ScriptedProvider::new("second", |text, _, _| Ok(text.to_string())).shared();
        let llm = FakeLlm::replying("Answer.").shared();
        let advisor = orchestrator(vec![first, second], llm);

        let document = "Le locataire doit payer le loyer. ".repeat(1000);
        let query = Query::new("When is rent due?")
            .with_document(document, DocumentLanguage::Known(Language::Fr));
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(
            answer.degradations,
            vec![
                Degradation::DocumentTruncated,
                Degradation::DocumentTranslationFallback
            ]
        );
        assert_eq!(answer.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_untranslated_document_passes_through() {
        let llm = FakeLlm::replying("Answer.").shared();
        let advisor = orchestrator(vec![ScriptedProvider::failing("only").shared()], llm.clone());

        let query = Query::new("What does it say?")
            .with_document("Het contract eindigt in mei.", DocumentLanguage::Known(Language::Nl));
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(answer.confidence, Confidence::Medium);
        assert!(llm.last_prompt().unwrap().contains("Het contract eindigt in mei."));
    }

    #[tokio::test]
    async fn test_detected_document_language() {
        let provider = ScriptedProvider::tagging("primary").shared();
        let llm = FakeLlm::replying("Answer.").shared();
        let advisor = orchestrator(vec![provider], llm.clone());

        let query = Query::new("When must I pay?").with_document(
            "El inquilino debe pagar el alquiler antes del quinto día de cada mes.",
            DocumentLanguage::Auto,
        );
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(answer.confidence, Confidence::High);
        assert!(llm.last_prompt().unwrap().contains("[en] El inquilino"));
    }

    #[tokio::test]
    async fn test_bad_input() {
        let llm = FakeLlm::replying("unused").shared();
        let advisor = orchestrator(Vec::new(), llm.clone());

        let err = advisor.answer(&Query::new("  <p> </p> ")).await.unwrap_err();
        assert_eq!(err.code(), "bad-input");

        let err = advisor.answer(&Query::new("a".repeat(5001))).await.unwrap_err();
        assert_eq!(err.code(), "bad-input");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_visa_document_adds_context_note() {
        let provider = ScriptedProvider::tagging("primary").shared();
        let llm = FakeLlm::replying("Renew it before it expires.").shared();
        let advisor = orchestrator(vec![provider], llm);

        let query = Query::new("When must I renew?")
            .with_document(
                "Your residence permit for family reunification expires in May.",
                DocumentLanguage::Known(Language::En),
            )
            .with_preferred_lang(Language::Es);
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(
            answer.response,
            "[es] Renew it before it expires.\n\n\
             (Detected visa-related context: residence, permit, family)"
        );
        assert_eq!(answer.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn test_unrelated_document_has_no_context_note() {
        let llm = FakeLlm::replying("Pay by the fifth.").shared();
        let advisor = orchestrator(vec![ScriptedProvider::tagging("primary").shared()], llm);

        let query = Query::new("When is rent due?").with_document(
            "The tenant pays the rent before the fifth day of each month.",
            DocumentLanguage::Known(Language::En),
        );
        let answer = advisor.answer(&query).await.unwrap();

        assert_eq!(answer.response, "Pay by the fifth.");
    }

    #[tokio::test]
    async fn test_logs_carry_no_document_text_or_key() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const DOCUMENT: &str = "Clausula Zorbulax-7731: el arrendatario renuncia al deposito.";
        const API_KEY: &str = "AIza-Quixotic-4417-secret";

        let logs = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("expat_legal_advisor=trace"))
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "The deposit clause applies." }] } }]
            })))
            .mount(&server)
            .await;

        let config = AdvisorConfig {
            google_api_key: Some(API_KEY.to_string()),
            llm_endpoint: server.uri(),
            llm_model: "test-model".to_string(),
            translation_endpoint: format!("{}/translate", server.uri()),
            // Nothing listens here, so MyMemory fails with a transport error
            mymemory_endpoint: "http://127.0.0.1:1/get".to_string(),
            enable_llm_translation: false,
            max_retries: 1,
            retry_delay_ms: 1,
            provider_timeout_ms: 2000,
            ..Default::default()
        };
        let advisor = AnswerOrchestrator::from_config(&config).unwrap();

        let translated = advisor
            .chain()
            .translate_text(DOCUMENT, Language::Es, Language::En)
            .await;
        assert!(translated.fell_back());

        let query = Query::new("Do I lose my deposit?")
            .with_document(DOCUMENT, DocumentLanguage::Known(Language::Es))
            .with_preferred_lang(Language::Es);
        let answer = advisor.answer(&query).await.unwrap();
        assert_eq!(answer.confidence, Confidence::Low);

        let output = logs.contents();
        assert!(output.contains("translation attempt"));
        assert!(output.contains("LLM request failed"));
        assert!(!output.contains("Zorbulax"));
        assert!(!output.contains(API_KEY));
    }

    #[tokio::test]
    async fn test_response_is_clipped() {
        let llm = FakeLlm::replying(&"word ".repeat(1000)).shared();
        let advisor = orchestrator(Vec::new(), llm);

        let answer = advisor.answer(&Query::new("Explain.")).await.unwrap();
        assert!(answer.response.ends_with("..."));
        assert_eq!(answer.response.chars().count(), 2003);
    }
}
