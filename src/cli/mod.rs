//! CLI module for the document question answering tool.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask questions about your JSON documents with retrieval-augmented generation.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a JSON file, chunk it and store the chunks in the vector store
    Ingest(commands::IngestArgs),

    /// Answer a question from the stored documents
    Query(commands::QueryArgs),

    /// Show how a JSON messages file would be chunked
    Split(commands::SplitArgs),

    /// Show configuration summary and vector store contents
    Status(commands::StatusArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from(["docqa", "-f", "json", "query", "What color is the sky?"])
            .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Query(args) => assert_eq!(args.question, "What color is the sky?"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ingest_defaults() {
        let cli = Cli::try_parse_from(["docqa", "ingest", "data.json", "--verbose"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.path_expr, crate::services::MESSAGES_PATH_EXPR);
                assert!(args.persist_dir.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["docqa", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(commands::ConfigCommand::Init { force: true })
        ));

        let cli = Cli::try_parse_from(["docqa", "config", "init", "-f", "json"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Config(commands::ConfigCommand::Init { force: false })
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
