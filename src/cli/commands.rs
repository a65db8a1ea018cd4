//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::config::AdvisorConfig;
use crate::core::errors::AdvisorError;
use crate::core::llm::{GeminiClient, LlmClient};
use crate::core::models::{DocumentLanguage, Language, Query, TranslationStatus};
use crate::core::orchestrator::{build_provider_chain, AnswerOrchestrator};
use crate::core::prompt::PRIVACY_NOTICE;
use crate::processors::detector::LanguageDetector;
use crate::processors::extractor::{DocumentExtractor, FileExtractor};

/// Commands for the legal advisor
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question, optionally about a document
    Ask {
        /// The question
        question: String,

        /// Document to ground the answer in (.txt, .md, .docx, .pdf)
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Document language code, or auto to detect it
        #[arg(long, default_value = "auto")]
        doc_lang: DocumentLanguage,

        /// Language of the answer
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },

    /// Detect the language of a document
    Detect {
        /// Input file (required)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Translate a document through the provider chain
    Translate {
        /// Input file (required)
        #[arg(short, long)]
        file: PathBuf,

        /// Source language code, or auto to detect it
        #[arg(long, default_value = "auto")]
        from: DocumentLanguage,

        /// Target language code
        #[arg(short, long, default_value = "en")]
        to: Language,
    },

    /// Start HTTP API server
    Server {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 8000)
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message.to_string());
    Ok(pb)
}

fn read_document(config: &AdvisorConfig, file: &Path) -> anyhow::Result<String> {
    let extractor = FileExtractor::new(config.max_upload_bytes);
    extractor
        .extract(file)
        .map_err(|e| user_facing(AdvisorError::from(e)))
}

fn user_facing(err: AdvisorError) -> anyhow::Error {
    warn!(code = err.code(), error = %err, "request failed");
    anyhow::anyhow!(err.user_message())
}

/// Handle ask command
pub async fn handle_ask(
    config: &AdvisorConfig,
    question: String,
    document: Option<PathBuf>,
    doc_lang: DocumentLanguage,
    lang: Language,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let orchestrator = AnswerOrchestrator::from_config(config).map_err(user_facing)?;

    let mut query = Query::new(question).with_preferred_lang(lang);
    if let Some(path) = document {
        info!("Document: {}", path.display());
        let pb = spinner("Reading document...")?;
        let text = read_document(config, &path);
        pb.finish_and_clear();
        query = query.with_document(text?, doc_lang);
    }

    let pb = spinner("Analyzing...")?;
    let result = orchestrator.answer(&query).await;
    pb.finish_and_clear();
    let answer = result.map_err(user_facing)?;

    info!(
        "Answered in {:?} with {} confidence",
        start_time.elapsed(),
        answer.confidence
    );

    println!("{}", answer.response);
    println!();
    println!("Confidence: {}", answer.confidence);
    println!("{}", PRIVACY_NOTICE);

    Ok(())
}

/// Handle detect command
pub async fn handle_detect(config: &AdvisorConfig, file: PathBuf) -> anyhow::Result<()> {
    let text = read_document(config, &file)?;
    let detector =
        LanguageDetector::new(config.detection_min_chars, config.detection_min_confidence);
    let detection = detector.detect(&text);

    println!(
        "{} ({}), confidence {:.2}{}",
        detection.language.name(),
        detection.language.code(),
        detection.confidence,
        if detection.defaulted { ", defaulted" } else { "" }
    );

    Ok(())
}

/// Handle translate command
pub async fn handle_translate(
    config: &AdvisorConfig,
    file: PathBuf,
    from: DocumentLanguage,
    to: Language,
) -> anyhow::Result<()> {
    let text = read_document(config, &file)?;

    let source = match from {
        DocumentLanguage::Known(lang) => lang,
        DocumentLanguage::Auto => {
            let detector =
                LanguageDetector::new(config.detection_min_chars, config.detection_min_confidence);
            let detection = detector.detect(&text);
            info!(
                "Detected {} (confidence {:.2})",
                detection.language, detection.confidence
            );
            detection.language
        }
    };

    // Cloud translation and MyMemory still work without an LLM key
    let llm = match GeminiClient::new(config) {
        Ok(client) => Some(Arc::new(client) as Arc<dyn LlmClient>),
        Err(e) => {
            warn!("LLM translation disabled: {}", e);
            None
        }
    };
    let chain = build_provider_chain(config, llm)?;

    let pb = spinner(&format!("Translating {} -> {}...", source, to))?;
    let result = chain.translate_text(&text, source, to).await;
    pb.finish_and_clear();

    println!("{}", result.text);
    match result.status {
        TranslationStatus::Unchanged => eprintln!("Source and target language are the same."),
        TranslationStatus::Translated => eprintln!(
            "Translated by {} (tried: {})",
            result.provider.as_deref().unwrap_or_default(),
            result.attempted.join(", ")
        ),
        TranslationStatus::Untranslated => eprintln!(
            "No translation available (tried: {}); original text shown.",
            result.attempted.join(", ")
        ),
    }

    Ok(())
}

/// Handle server command
pub async fn handle_server(config: AdvisorConfig, host: String, port: u16) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("Server starting on http://{}:{}", host, port);
    println!("OpenAPI document: http://{}:{}/api-docs/openapi.json", host, port);

    run_server(config, host, port).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_ask_defaults() {
        let cli = TestCli::try_parse_from(["advisor", "ask", "What visa do I need?"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                document,
                doc_lang,
                lang,
            } => {
                assert_eq!(question, "What visa do I need?");
                assert!(document.is_none());
                assert_eq!(doc_lang, DocumentLanguage::Auto);
                assert_eq!(lang, Language::En);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_language() {
        let result = TestCli::try_parse_from(["advisor", "ask", "Hi?", "--lang", "pt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_translate() {
        let cli = TestCli::try_parse_from([
            "advisor", "translate", "--file", "a.txt", "--from", "de", "--to", "es",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Translate {
                from: DocumentLanguage::Known(Language::De),
                to: Language::Es,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_detect_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(
            file,
            "Der Arbeitnehmer muss die Aufenthaltserlaubnis vor Ablauf der Frist verlängern."
        )
        .unwrap();

        let config = AdvisorConfig::default();
        assert!(handle_detect(&config, file.path().to_path_buf()).await.is_ok());
    }

    #[tokio::test]
    async fn test_detect_rejects_legacy_doc() {
        let file = tempfile::Builder::new().suffix(".doc").tempfile().unwrap();
        let err = handle_detect(&AdvisorConfig::default(), file.path().to_path_buf())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
