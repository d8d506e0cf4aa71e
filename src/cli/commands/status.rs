use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

use super::load_config;
use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::OutputFormat;
use crate::services::{DB_FILE_NAME, SqliteVectorStore};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long, help = "Vector store directory (overrides config)")]
    pub persist_dir: Option<PathBuf>,
}

pub async fn handle_status(args: StatusArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = load_config(args.persist_dir)?;
    let formatter = get_formatter(format);

    let persist_directory = &config.vector_store.persist_directory;
    let store_exists = persist_directory.join(DB_FILE_NAME).is_file();

    let chunk_count = if store_exists {
        match SqliteVectorStore::count_collection(persist_directory, &config.vector_store.collection)
        {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "failed to count chunks");
                None
            }
        }
    } else {
        None
    };

    let status = StatusInfo {
        llm_model: config.gemini.llm_model.clone(),
        embedding_model: config.gemini.embedding_model.clone(),
        api_key_configured: config
            .gemini
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty()),
        persist_directory: persist_directory.display().to_string(),
        collection: config.vector_store.collection.clone(),
        store_exists,
        chunk_count,
        chunk_size: config.indexing.chunk_size,
        chunk_overlap: config.indexing.chunk_overlap,
        top_k: config.retrieval.top_k,
    };

    print!("{}", formatter.format_status(&status));
    Ok(())
}
