use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::load_documents;

#[derive(Debug, Args)]
pub struct SplitArgs {
    #[arg(required = true, help = "JSON file with a top-level \"messages\" array")]
    pub file: PathBuf,
}

pub async fn handle_split(args: SplitArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    let chunks = load_documents(&args.file)
        .with_context(|| format!("failed to split {}", args.file.display()))?;

    print!("{}", formatter.format_chunks(&chunks));
    Ok(())
}
