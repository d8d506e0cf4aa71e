mod config;
mod document;
mod query;

pub use config::{
    Config, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_MODEL, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_LLM_MODEL, DEFAULT_PERSIST_DIRECTORY, GeminiConfig, IndexingConfig, RetrievalConfig,
    VectorStoreConfig,
};
pub use document::{Document, Metadata, StoredChunk};
pub use query::{OutputFormat, QueryResult, SNIPPET_MAX_CHARS, SourceDocument};
