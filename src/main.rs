//! Main entry point for the Expat Legal Advisor CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expat_legal_advisor::cli::commands::{self, Commands};
use expat_legal_advisor::AdvisorConfig;

/// Expat Legal Advisor - multilingual legal-document Q&A
#[derive(Parser, Debug)]
#[command(name = "expat-legal-advisor", version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON, TOML or YAML); environment variables otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => AdvisorConfig::from_file(path)?,
        None => AdvisorConfig::from_env()?,
    };

    match args.command {
        Some(Commands::Ask {
            question,
            document,
            doc_lang,
            lang,
        }) => {
            commands::handle_ask(&config, question, document, doc_lang, lang).await?;
        }
        Some(Commands::Detect { file }) => {
            commands::handle_detect(&config, file).await?;
        }
        Some(Commands::Translate { file, from, to }) => {
            commands::handle_translate(&config, file, from, to).await?;
        }
        Some(Commands::Server { host, port }) => {
            commands::handle_server(config, host, port).await?;
        }
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
