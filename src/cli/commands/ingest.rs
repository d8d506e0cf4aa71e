use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use super::load_config;
use crate::cli::output::{IngestStats, get_formatter};
use crate::models::OutputFormat;
use crate::services::{JsonLoader, MESSAGES_PATH_EXPR, RagSystem};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "JSON file to ingest")]
    pub file: PathBuf,

    #[arg(
        long,
        default_value = MESSAGES_PATH_EXPR,
        help = "Path expression selecting the documents (jq subset)"
    )]
    pub path_expr: String,

    #[arg(long, help = "Require every selected value to be a string")]
    pub text_only: bool,

    #[arg(long, help = "Vector store directory (overrides config)")]
    pub persist_dir: Option<PathBuf>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = load_config(args.persist_dir)?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let documents = JsonLoader::new(&args.file, &args.path_expr)
        .with_text_content(args.text_only)
        .load()
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    if verbose {
        eprintln!(
            "Loaded {} documents from {}",
            documents.len(),
            args.file.display()
        );
    }

    let collection = config.vector_store.collection.clone();
    let mut rag = RagSystem::new(config);
    let chunks = rag.add_documents(&documents, true).await?;

    let stats = IngestStats {
        file: args.file.display().to_string(),
        documents: documents.len() as u64,
        chunks_created: chunks as u64,
        collection,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    info!(documents = stats.documents, chunks = stats.chunks_created, "ingest finished");

    print!("{}", formatter.format_ingest_stats(&stats));
    Ok(())
}
