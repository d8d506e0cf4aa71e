use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::load_config;
use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::RagSystem;

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(required = true, help = "Question to answer")]
    pub question: String,

    #[arg(long, short = 'k', help = "Number of chunks to retrieve")]
    pub top_k: Option<usize>,

    #[arg(long, help = "Vector store directory (overrides config)")]
    pub persist_dir: Option<PathBuf>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let mut config = load_config(args.persist_dir)?;
    if let Some(k) = args.top_k {
        if k == 0 {
            anyhow::bail!("top-k must be at least 1");
        }
        config.retrieval.top_k = k;
    }
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Question: \"{question}\"");
        eprintln!("  Top-K: {}", config.retrieval.top_k);
        eprintln!(
            "  Store: {}",
            config.vector_store.persist_directory.display()
        );
    }

    let persist_directory = config.vector_store.persist_directory.clone();
    let mut rag = RagSystem::new(config);
    rag.initialize(&persist_directory)?;

    let result = rag.query(question).await?;
    print!("{}", formatter.format_query_result(&result));
    Ok(())
}
