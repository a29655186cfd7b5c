//! Docent CLI - Command-line interface
//!
//! Usage:
//!   docent ingest [--dir <path>]
//!   docent ask <question>
//!   docent ask --stream <question>

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docent_core::AppConfig;
use docent_rag::build_components;
use futures::StreamExt;

#[derive(Parser)]
#[command(name = "docent")]
#[command(about = "Document-grounded assistant CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest .txt documents into the vector store
    Ingest {
        /// Directory to read documents from (defaults to the configured data dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Ask a question grounded in the ingested documents
    Ask {
        /// Question to ask
        question: String,

        /// Stream the answer as it is generated
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let rag = build_components(&config).await?;

    match cli.command {
        Commands::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| config.retrieval.data_dir.clone());
            let count = rag.ingestor.ingest_dir(&dir).await?;
            println!("Ingested {count} chunks from {}", dir.display());
        }
        Commands::Ask { question, stream } => {
            if stream {
                let mut fragments = rag.assistant.answer_stream(&question).await?;
                while let Some(fragment) = fragments.next().await {
                    print!("{}", fragment?);
                }
                println!();
            } else {
                let answer = rag.assistant.answer(&question).await?;
                println!("{answer}");
            }
        }
    }

    Ok(())
}
