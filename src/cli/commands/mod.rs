mod config;
mod ingest;
mod query;
mod split;
mod status;

pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;
pub use split::SplitArgs;
pub use status::StatusArgs;

pub use config::handle_config;
pub use ingest::handle_ingest;
pub use query::handle_query;
pub use split::handle_split;
pub use status::handle_status;

use std::path::PathBuf;

use crate::models::Config;

/// Load config and apply a `--persist-dir` override.
pub(crate) fn load_config(persist_dir: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(dir) = persist_dir {
        config.vector_store.persist_directory = dir;
    }
    Ok(config)
}
