//! Core data models for the question-answering pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the advisor can read documents in and answer in
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English, also the working language of the LLM
    #[default]
    En,
    /// Spanish
    Es,
    /// French
    Fr,
    /// Dutch
    Nl,
    /// German
    De,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::Nl,
        Language::De,
    ];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Nl => "nl",
            Language::De => "de",
        }
    }

    /// Human-readable name, used in prompts
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::Nl => "Dutch",
            Language::De => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a language code is not in the supported set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language code: {}", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "es" | "spanish" => Ok(Language::Es),
            "fr" | "french" => Ok(Language::Fr),
            "nl" | "dutch" => Ok(Language::Nl),
            "de" | "german" => Ok(Language::De),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// Declared document language, or a request to detect it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentLanguage {
    /// Detect from the document text
    #[default]
    Auto,
    /// Caller-declared language
    Known(Language),
}

impl FromStr for DocumentLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(DocumentLanguage::Auto);
        }
        s.parse().map(DocumentLanguage::Known)
    }
}

impl fmt::Display for DocumentLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLanguage::Auto => write!(f, "auto"),
            DocumentLanguage::Known(lang) => write!(f, "{}", lang),
        }
    }
}

/// Translation request
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: Language,
    pub target_lang: Language,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source_lang: Language, target_lang: Language) -> Self {
        Self {
            text: text.into(),
            source_lang,
            target_lang,
        }
    }

    /// Whether the request needs no provider at all
    pub fn is_passthrough(&self) -> bool {
        self.source_lang == self.target_lang || self.text.trim().is_empty()
    }
}

/// How a translation request was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    /// Same language or blank text, no provider called
    Unchanged,
    /// A provider translated every chunk
    Translated,
    /// Every provider failed; the text is the untranslated original
    Untranslated,
}

/// Translation result
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub text: String,
    /// Name of the provider that succeeded, if any
    pub provider: Option<String>,
    /// Providers tried in order, winner last
    pub attempted: Vec<String>,
    pub status: TranslationStatus,
}

impl TranslationResult {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider: None,
            attempted: Vec::new(),
            status: TranslationStatus::Unchanged,
        }
    }

    pub fn untranslated(text: impl Into<String>, attempted: Vec<String>) -> Self {
        Self {
            text: text.into(),
            provider: None,
            attempted,
            status: TranslationStatus::Untranslated,
        }
    }

    /// True when the first-choice provider did not produce this result
    pub fn fell_back(&self) -> bool {
        match self.status {
            TranslationStatus::Unchanged => false,
            TranslationStatus::Translated => self.attempted.len() > 1,
            TranslationStatus::Untranslated => true,
        }
    }
}

/// Pipeline stage that fell back from its preferred behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Detection was inconclusive and the default language was assumed
    LanguageDefaulted,
    /// The document exceeded the size ceiling
    DocumentTruncated,
    /// The document leg used a later provider or none at all
    DocumentTranslationFallback,
    /// The answer leg used a later provider or none at all
    AnswerTranslationFallback,
}

/// Coarse trust signal attached to an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// A question submitted to the advisor
#[derive(Debug, Clone)]
pub struct Query {
    pub question: String,
    pub document: Option<String>,
    pub document_lang: DocumentLanguage,
    pub preferred_lang: Language,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            document: None,
            document_lang: DocumentLanguage::Auto,
            preferred_lang: Language::En,
        }
    }

    pub fn with_document(mut self, document: impl Into<String>, lang: DocumentLanguage) -> Self {
        self.document = Some(document.into());
        self.document_lang = lang;
        self
    }

    pub fn with_preferred_lang(mut self, lang: Language) -> Self {
        self.preferred_lang = lang;
        self
    }
}

/// Final answer returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub response: String,
    pub confidence: Confidence,
    pub degradations: Vec<Degradation>,
}

/// Query usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub daily_limit: usize,
    pub total_queries: usize,
    pub daily_queries: usize,
    pub document_uploads: usize,
    pub errors: usize,
    pub language_usage: std::collections::BTreeMap<String, usize>,
    pub last_reset: chrono::DateTime<chrono::Utc>,
}

impl UsageStats {
    pub fn new(daily_limit: usize) -> Self {
        Self {
            daily_limit,
            total_queries: 0,
            daily_queries: 0,
            document_uploads: 0,
            errors: 0,
            language_usage: Default::default(),
            last_reset: chrono::Utc::now(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.daily_limit.saturating_sub(self.daily_queries)
    }

    pub fn reset_if_needed(&mut self) {
        let now = chrono::Utc::now();
        if now.date_naive() != self.last_reset.date_naive() {
            self.daily_queries = 0;
            self.last_reset = now;
        }
    }
}
