//! Best-effort document language detection

use tracing::debug;
use whatlang::{Detector, Lang};

use crate::core::models::Language;

/// Minimum input length, in characters, worth classifying
pub const DEFAULT_MIN_CHARS: usize = 20;

/// Detection outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub language: Language,
    pub confidence: f64,
    /// True when the fallback language was assumed
    pub defaulted: bool,
}

/// Trigram-based detector restricted to the supported languages
pub struct LanguageDetector {
    detector: Detector,
    fallback: Language,
    min_chars: usize,
    min_confidence: f64,
}

impl std::fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("fallback", &self.fallback)
            .field("min_chars", &self.min_chars)
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS, 0.25)
    }
}

impl LanguageDetector {
    pub fn new(min_chars: usize, min_confidence: f64) -> Self {
        let allowlist = Language::ALL.iter().map(|l| to_whatlang(*l)).collect();
        Self {
            detector: Detector::with_allowlist(allowlist),
            fallback: Language::En,
            min_chars,
            min_confidence,
        }
    }

    /// Detect the language of `text`. Never fails; inconclusive input yields
    /// the fallback language with `defaulted` set.
    pub fn detect(&self, text: &str) -> Detection {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_chars {
            debug!(len = trimmed.len(), "input too short for detection");
            return self.fallback();
        }

        let Some(info) = self.detector.detect(trimmed) else {
            debug!("detector returned no result");
            return self.fallback();
        };

        let confidence = info.confidence();
        match from_whatlang(info.lang()) {
            Some(language) if confidence >= self.min_confidence => Detection {
                language,
                confidence,
                defaulted: false,
            },
            _ => {
                debug!(
                    lang = info.lang().code(),
                    confidence, "detection below threshold"
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Detection {
        Detection {
            language: self.fallback,
            confidence: 0.0,
            defaulted: true,
        }
    }
}

fn to_whatlang(lang: Language) -> Lang {
    match lang {
        Language::En => Lang::Eng,
        Language::Es => Lang::Spa,
        Language::Fr => Lang::Fra,
        Language::Nl => Lang::Nld,
        Language::De => Lang::Deu,
    }
}

fn from_whatlang(lang: Lang) -> Option<Language> {
    match lang {
        Lang::Eng => Some(Language::En),
        Lang::Spa => Some(Language::Es),
        Lang::Fra => Some(Language::Fr),
        Lang::Nld => Some(Language::Nl),
        Lang::Deu => Some(Language::De),
        _ => None,
    }
}
