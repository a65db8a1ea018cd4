//! Expat Legal Advisor - multilingual legal-document Q&A
//!
//! Answers questions about legal documents in English, Spanish, French, Dutch
//! and German. Documents and answers pass through an ordered chain of
//! translation providers; a hosted LLM produces the answer in English, and
//! every answer carries a High/Medium/Low confidence label derived from the
//! fallbacks taken on the way.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod processors;
pub mod providers;
pub mod server;

// Re-export key types for convenience
pub use crate::core::{
    chain::TranslationProviderChain,
    config::AdvisorConfig,
    errors::{AdvisorError, ErrorKind, TranslationError},
    llm::{GeminiClient, LlmClient},
    models::{
        Answer, Confidence, Degradation, DocumentLanguage, Language, Query, TranslationRequest,
        TranslationResult, TranslationStatus,
    },
    orchestrator::AnswerOrchestrator,
};

pub use crate::processors::{
    chunker::ChunkSplitter, detector::LanguageDetector, truncator::DocumentTruncator,
};

pub use crate::providers::TranslationProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
