//! Error types for the docqa crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to build embedding client: {0}")]
    ClientError(String),

    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors related to chat completion.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build chat client: {0}")]
    ClientError(String),

    #[error("failed to connect to chat service: {0}")]
    ConnectionError(String),

    #[error("chat service error: {0}")]
    ServerError(String),

    #[error("chat request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("prompt blocked: {0}")]
    Blocked(String),
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("corrupt embedding for chunk {0}")]
    CorruptEmbedding(String),

    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },
}

/// Errors related to loading documents from JSON files.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    #[error("selection failed: {0}")]
    Selection(String),
}

/// Error from one of the remote or storage services behind the RAG system.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

/// Coarse classification of a [`RagError`], for branching without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    NotInitialized,
    InvalidPath,
    Upstream,
}

/// Errors surfaced by the vector store manager and the RAG system.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0} not initialized, call initialize() first")]
    NotInitialized(&'static str),

    #[error("persist path {} is a file, use a directory such as ./chroma_db", .0.display())]
    InvalidPath(PathBuf),

    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl RagError {
    pub fn upstream(context: &'static str, source: impl Into<UpstreamError>) -> Self {
        RagError::Upstream {
            context,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Config(_) => ErrorKind::Config,
            RagError::NotInitialized(_) => ErrorKind::NotInitialized,
            RagError::InvalidPath(_) => ErrorKind::InvalidPath,
            RagError::Upstream { .. } => ErrorKind::Upstream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RagError::NotInitialized("vector store").kind(),
            ErrorKind::NotInitialized
        );
        assert_eq!(
            RagError::InvalidPath(PathBuf::from("/tmp/x")).kind(),
            ErrorKind::InvalidPath
        );
        let err = RagError::upstream(
            "failed to process query",
            LlmError::ServerError("status 500".to_string()),
        );
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(
            err.to_string(),
            "failed to process query: chat service error: status 500"
        );
    }

    #[test]
    fn test_not_initialized_message() {
        let err = RagError::NotInitialized("RAG system");
        assert_eq!(
            err.to_string(),
            "RAG system not initialized, call initialize() first"
        );
    }
}
