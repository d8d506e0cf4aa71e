pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::{ErrorKind, RagError};
pub use models::{Config, Document, OutputFormat, QueryResult};
pub use services::{RagSystem, VectorStoreManager, load_documents};
